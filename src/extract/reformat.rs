//! Best-effort reformatting of assistant replies that arrive as unfenced code
//!
//! Models sometimes answer with a compressed shell session, a one-line
//! Kubernetes manifest or a bare Java file. These passes wrap such replies in
//! fenced blocks so the renderer and the extractors see proper code.

use once_cell::sync::Lazy;
use regex::Regex;

static SHELL_SIGNAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:#!/|export\s+\w+=|\boc\s+|\bkubectl\s+|\bhelm\s+|chmod\s+\+x|^bash\s)")
        .expect("shell signal regex")
});

static AND_CHAIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*&&\s*").expect("&& regex"));
static SEMICOLON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r";\s*").expect("; regex"));
static EXPORT_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(export\s+\w+=)").expect("export split regex"));
static OC_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+(oc\s)").expect("oc split regex"));
static KUBECTL_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(kubectl\s)").expect("kubectl split regex"));
static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("blank run regex"));

static YAML_API_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)apiVersion:\s*\S+").expect("apiVersion regex"));
static YAML_KIND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)kind:\s*\S+").expect("kind regex"));

/// Manifest keys that start a new line when a manifest arrives on one line
const YAML_KEYS: [&str; 14] = [
    "apiVersion",
    "kind",
    "metadata",
    "spec",
    "features",
    "license",
    "installIBMCatalogSource",
    "isDisconnected",
    "deployment",
    "meterDefinitionCatalogServer",
    "registration",
    "name",
    "namespace",
    "accept",
];

static YAML_KEY_RES: Lazy<Vec<(Regex, String)>> = Lazy::new(|| {
    YAML_KEYS
        .iter()
        .map(|key| {
            let re = Regex::new(&format!(r"\s+{key}:(\s|$)")).expect("yaml key regex");
            (re, format!("\n{key}:${{1}}"))
        })
        .collect()
});

/// Indents the first line under each block key
static YAML_INDENTS: Lazy<Vec<(Regex, String)>> = Lazy::new(|| {
    [
        ("metadata", "  "),
        ("spec", "  "),
        ("features", "    "),
        ("license", "    "),
    ]
    .into_iter()
    .map(|(key, indent)| {
        let re = Regex::new(&format!(r"{key}:\n([^\n]+)")).expect("yaml indent regex");
        (re, format!("{key}:\n{indent}${{1}}"))
    })
    .collect()
});

static JAVA_SIGNAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"public\s+class|class\s+\w+|package\s+[\w.]+;").expect("java signal regex")
});
static JAVA_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:package|import|public|class)\s").expect("java start regex"));

/// Apply the shell, YAML and Java passes in that order
pub fn normalize_reply(raw: &str) -> String {
    let text = reformat_shell(raw);
    let text = reformat_yaml(&text);
    reformat_java(&text)
}

/// Wrap a chained shell session in a ```bash fence, one command per line
pub fn reformat_shell(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains("```") || !SHELL_SIGNAL_RE.is_match(trimmed) {
        return raw.to_string();
    }

    let script = AND_CHAIN_RE.replace_all(trimmed, " && ");
    let script = SEMICOLON_RE.replace_all(&script, ";");
    let script = break_semicolons(&script);
    let script = script.replace(" && ", " &&\n");

    let script = EXPORT_SPLIT_RE.replace_all(&script, "\n${1}");
    let script = OC_SPLIT_RE.replace_all(&script, "\n${1}");
    let script = KUBECTL_SPLIT_RE.replace_all(&script, "\n${1}");
    let script = BLANK_RUN_RE.replace_all(&script, "\n\n");

    let script: Vec<&str> = script.split('\n').map(str::trim_end).collect();
    format!("```bash\n{}\n```", script.join("\n"))
}

/// Every `;` that is not the final character becomes a line break
fn break_semicolons(script: &str) -> String {
    let last = script.len().saturating_sub(1);
    script
        .char_indices()
        .map(|(i, c)| if c == ';' && i < last { '\n' } else { c })
        .collect()
}

/// Wrap a Kubernetes-style manifest in a ```yaml fence, unfolding one-line manifests
pub fn reformat_yaml(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains("```")
        || !YAML_API_VERSION_RE.is_match(trimmed)
        || !YAML_KIND_RE.is_match(trimmed)
    {
        return raw.to_string();
    }

    if trimmed.contains('\n') && trimmed.contains("metadata:") {
        return format!("```yaml\n{trimmed}\n```");
    }

    let mut manifest = trimmed.to_string();
    for (re, replacement) in YAML_KEY_RES.iter() {
        manifest = re.replace_all(&manifest, replacement.as_str()).into_owned();
    }
    for (re, replacement) in YAML_INDENTS.iter() {
        manifest = re.replace(&manifest, replacement.as_str()).into_owned();
    }
    format!("```yaml\n{manifest}\n```")
}

/// Fence an unfenced Java source, keeping any leading prose outside the fence
pub fn reformat_java(raw: &str) -> String {
    if raw.contains("```") || !JAVA_SIGNAL_RE.is_match(raw) {
        return raw.to_string();
    }

    let lines: Vec<&str> = raw.lines().collect();
    let Some(start) = lines
        .iter()
        .position(|line| JAVA_START_RE.is_match(line.trim()))
    else {
        return raw.to_string();
    };

    let before = lines[..start].join("\n");
    let before = before.trim();
    let code = lines[start..].join("\n");
    let code = code.trim();
    if code.is_empty() {
        return raw.to_string();
    }

    if before.is_empty() {
        format!("```java\n{code}\n```")
    } else {
        format!("{before}\n\n```java\n{code}\n```")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_chain_split_into_lines() {
        let out = reformat_shell("export A=1 export B=2 && kubectl apply -f x.yaml; oc get pods");
        assert_eq!(
            out,
            "```bash\nexport A=1\nexport B=2 &&\nkubectl apply -f x.yaml\noc get pods\n```"
        );
    }

    #[test]
    fn test_shell_leaves_prose_and_fenced_text() {
        let prose = "Caching reduces latency.";
        assert_eq!(reformat_shell(prose), prose);

        let fenced = "Run this:\n```bash\nkubectl get pods\n```";
        assert_eq!(reformat_shell(fenced), fenced);
    }

    #[test]
    fn test_trailing_semicolon_kept() {
        assert_eq!(break_semicolons("a;b;"), "a\nb;");
    }

    #[test]
    fn test_one_line_manifest_unfolded() {
        let out = reformat_yaml("apiVersion: v1 kind: Namespace metadata: name: demo");
        assert_eq!(
            out,
            "```yaml\napiVersion: v1\nkind: Namespace\nmetadata:\n  name: demo\n```"
        );
    }

    #[test]
    fn test_multiline_manifest_just_fenced() {
        let manifest = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: x";
        assert_eq!(reformat_yaml(manifest), format!("```yaml\n{manifest}\n```"));
    }

    #[test]
    fn test_java_prose_kept_outside_fence() {
        let raw = "Here is the class:\npackage demo;\npublic class A {}";
        assert_eq!(
            reformat_java(raw),
            "Here is the class:\n\n```java\npackage demo;\npublic class A {}\n```"
        );
    }

    #[test]
    fn test_plain_markdown_untouched() {
        let doc = "## Create Widget\nPOST https://api.x.com/widgets";
        assert_eq!(normalize_reply(doc), doc);
    }
}
