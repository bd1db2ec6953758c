//! Minimal XHTML pages for messages shown instead of the protected content.

/// Escape text for use inside XHTML element content or attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// A complete page showing `message` as its only heading.
pub fn site_message(message: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN"
    "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
	<meta http-equiv="Content-Type" content="text/html; charset=utf-8" />
	<meta name="robots" content="noindex,nofollow,noarchive" />
	<title></title>
	<style type="text/css">
	body, p, div {{ font-family: Verdana, Arial, Helvetica, Sans-Serif; color: #202020; }}
	h1 {{ font-family: "Courier New", Courier; color: #424242; font-size: 2em; margin: 20px 0 15px 0; }}
	</style>
</head>
<body>
	<div id="main" align="center">
		<h1>{}</h1>
	</div>
</body>
</html>
"#,
        escape(message)
    )
}
