/// Command vector running `script` through `sh -c`.
pub(crate) fn sh(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}
