#![no_main]
use badbox_log::{normalize_line_endings, FileStatus, LogParser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Logs are often not valid UTF-8, so feed the lossy conversion.
    let s = String::from_utf8_lossy(data);
    let s = normalize_line_endings(&s);

    // An oracle that answers from the input keeps every resolver branch reachable.
    let oracle = |path: &str| match path.len() % 3 {
        0 => FileStatus::Exists,
        1 => FileStatus::DoesNotExist,
        _ => FileStatus::Indeterminate,
    };
    let parser = LogParser::default().with_root("main.tex");
    let mut state = parser.state(&s);
    let _ = parser.run(&mut state, &oracle);
});
