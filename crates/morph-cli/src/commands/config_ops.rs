use std::fs;
use std::process;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub fn settings_export() {
    print!("{}", morph_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        morph_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: analysis.theta={}, nbest.default_n={}, unknown.max_group_length={}",
        s.analysis.theta, s.nbest.default_n, s.unknown.max_group_length
    );
}

/// Install `file` as the process-wide settings. Must run before any analysis.
pub fn settings_load(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    die!(
        morph_core::settings::init_custom(content),
        "Error in settings {file}: {}"
    );
}
