//! Startup banner listing the dependencies behind each deliberate weakness.

pub const BANNER: &str = "\
Known vulnerabilities in this app:
- jsonwebtoken 9 -> HS256 tokens on /login and /protected, guessable default secret \"weak-secret\", tokens without exp never expire
- reqwest 0.12 -> unrestricted outbound GET on /fetch-url (SSRF, no timeout, redirects followed)
- jexl-eval 0.4 -> caller templates evaluated as expressions on /render-template (template injection)
- axum 0.7 + percent-encoding 2 -> unbounded bracket-key nesting on /parse-data, __proto__ and constructor kept
- error responses echo raw downstream error messages

Test your remediation agent with:
1. cargo audit
2. cargo tree -i jsonwebtoken (to see the dependency chain)
3. cargo tree -i reqwest (another outbound surface)";

/// Log the listening port followed by the banner.
pub fn log_startup(port: u16) {
    tracing::info!(port, "Vulnerable app running on port {port}");
    tracing::info!("{BANNER}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_names_every_vulnerable_route() {
        for route in ["/login", "/protected", "/fetch-url", "/render-template", "/parse-data"] {
            assert!(BANNER.contains(route), "banner is missing {route}");
        }
    }

    #[test]
    fn banner_names_the_crate_behind_each_weakness() {
        for dependency in ["jsonwebtoken 9", "reqwest 0.12", "jexl-eval 0.4", "axum 0.7"] {
            assert!(BANNER.contains(dependency), "banner is missing {dependency}");
        }
    }
}
