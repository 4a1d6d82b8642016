fn main() {
    println!("cargo:rerun-if-changed=src/default_settings.toml");
    // The embedded defaults back the settings singleton, so a broken file
    // must fail the build rather than the first analysis.
    validate_settings(include_str!("src/default_settings.toml"));
}

fn validate_settings(content: &str) {
    let path = "src/default_settings.toml";
    let value: toml::Value = match content.parse() {
        Ok(v) => v,
        Err(e) => panic!("{path} contains invalid TOML: {e}"),
    };
    for section in ["analysis", "lattice", "nbest", "unknown"] {
        if value.get(section).and_then(|v| v.as_table()).is_none() {
            panic!("{path} is missing the [{section}] table");
        }
    }
    let classes = value
        .get("unknown")
        .and_then(|u| u.get("classes"))
        .and_then(|c| c.as_table());
    match classes {
        Some(c) if c.contains_key("default") => {}
        _ => panic!("{path} is missing [unknown.classes.default]"),
    }
}
