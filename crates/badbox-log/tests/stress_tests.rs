use badbox_log::{FileStatus, LogParser, Severity};

fn unknown(_: &str) -> FileStatus {
    FileStatus::Indeterminate
}

#[test]
fn test_garbage_terminates() {
    let inputs = [
        "((((((((((",
        "))))))))))",
        ")(()()(()))(",
        "(./",
        "(\"unterminated",
        "!",
        "! ",
        "l.5",
        "Warning: ",
        "Package  Warning: ",
        "Overfull \\hbox (",
        "\n\n\n   \t\n",
        "(./a.tex\n\n\n(./b.tex",
        "é(ü)ñ(./ö.tex)",
    ];
    for input in inputs {
        let _ = LogParser::default().parse(input, &unknown);
    }
}

#[test]
fn test_deep_nesting_unwinds() {
    let depth = 500;
    let mut input = String::new();
    for i in 0..depth {
        input.push_str(&format!("(./f{i}.tex\n"));
    }
    input.push_str("! Deepest.\n");
    for _ in 0..depth {
        input.push_str(")\n");
    }

    let parser = LogParser::default().with_root("main.tex");
    let mut state = parser.state(&input);
    let diagnostics = parser.run(&mut state, &unknown);

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].file.as_deref(), Some("./f499.tex"));
    assert_eq!(state.current_file(), Some("main.tex"));
    assert!(state.file_stack().is_empty());
}

#[test]
fn test_large_log() {
    let mut input = String::new();
    for i in 1..=2000 {
        input.push_str(&format!(
            "LaTeX Warning: Citation `key{i}' on page 1 undefined on input line {i}.\n\n"
        ));
        input.push_str("Some (unrelated) chatter [1] {/a/b.map}\n");
    }
    let diagnostics = LogParser::default().parse(&input, &unknown);
    assert_eq!(diagnostics.len(), 2000);
    assert!(diagnostics.iter().all(|d| d.severity == Severity::Warning));
    assert_eq!(diagnostics.last().map(|d| d.row), Some(2000));
}
