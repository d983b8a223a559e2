use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Namespace given to block names serialized without one (`wp:paragraph`).
pub(crate) const DEFAULT_NAMESPACE: &str = "core";

// Opening, closing and void block delimiters:
//   <!-- wp:ns/name {"attr":1} -->, <!-- /wp:ns/name -->, <!-- wp:name /-->
regex!(
    BLOCK_DELIMITER,
    r#"(?s)<!--\s+(?P<closer>/)?wp:(?P<namespace>[a-z][a-z0-9_-]*/)?(?P<name>[a-z][a-z0-9_-]*)\s+(?:(?P<attrs>\{.*?\})\s+)?(?P<void>/)?-->"#
);
