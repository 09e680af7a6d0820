//! CLI subcommands.

#[expect(
    unreachable_pub,
    reason = "binary crate — pub inside private module is fine"
)]
pub mod attach;
#[expect(
    unreachable_pub,
    reason = "binary crate — pub inside private module is fine"
)]
pub mod payload;
#[expect(
    unreachable_pub,
    reason = "binary crate — pub inside private module is fine"
)]
pub mod sign_blob;
#[expect(
    unreachable_pub,
    reason = "binary crate — pub inside private module is fine"
)]
pub mod verify;

/// Parse a `key=value` annotation flag.
fn parse_annotation(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("annotation must be KEY=VALUE, got `{s}`"))?;
    if key.is_empty() {
        return Err("annotation key must not be empty".to_owned());
    }
    Ok((key.to_owned(), value.to_owned()))
}

/// Read from a path, or from stdin when the path is `-`.
fn read_input(path: &str) -> std::io::Result<Vec<u8>> {
    use std::io::Read;

    if path == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        tracing::info!(path, "reading input from file");
        std::fs::read(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_splits_on_first_equals() {
        let (k, v) = parse_annotation("a=b=c").expect("parse");
        assert_eq!(k, "a");
        assert_eq!(v, "b=c");
    }

    #[test]
    fn annotation_requires_equals_and_key() {
        assert!(parse_annotation("novalue").is_err());
        assert!(parse_annotation("=value").is_err());
    }
}
