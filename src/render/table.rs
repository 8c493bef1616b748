//! Line-numbered table layout for highlighted HTML.

/// Wrap each `\n`-separated line of `html` in a numbered table row.
pub fn render_table(html: &str) -> String {
    let rows: Vec<String> = html
        .split('\n')
        .enumerate()
        .map(|(i, line)| format!("<tr><td>{}</td><td>{}</td></tr>", i + 1, line))
        .collect();

    format!("<pre><table>{}</table></pre>", rows.join("\n"))
}
