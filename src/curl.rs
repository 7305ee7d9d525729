//! cURL export of the request a console would send

use crate::network::proxy::ProxyRequest;

/// Single-quote a shell argument
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Format request as cURL command
pub fn to_curl(request: &ProxyRequest) -> String {
    let mut parts = vec!["curl".to_string()];

    // Method
    if request.method != "GET" {
        parts.push(format!("-X {}", request.method));
    }

    // URL
    parts.push(quote(&request.url));

    // Headers
    for (key, value) in &request.headers {
        parts.push(format!("-H {}", quote(&format!("{}: {}", key, value))));
    }

    // Body
    if !request.body.is_empty() {
        parts.push(format!("-d {}", quote(&request.body)));
    }

    parts.join(" \\\n  ")
}
