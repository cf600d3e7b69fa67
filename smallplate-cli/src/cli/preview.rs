//! HTML preview page wrapped around rendered output.
//!
//! The page shows the output as escaped text in a copyable box and renders it
//! in an iframe fed from a base64 `data:` URL.

use std::io::{self, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use smallplate_core::escape_html;

const PAGE_HEAD: &str = r#"
<html>
	<head>
		<title>Small Plate Preview</title>
		<style>
			body {
				padding: 20px;
				min-width: 100vw;
				min-height: 100vh;
				box-sizing: border-box;
			}
			textarea, iframe {
				resize: both;
				width: 50vw;
				height: 20vh;
				overflow: scroll;
			}
		</style>
	</head>
	<body>
		<label>
			<h2>Code:</h2>
			<textarea id="codebox">"#;

const PAGE_MIDDLE: &str = r#"</textarea>
			<script>
			document.getElementById('codebox').addEventListener('focus', function(e) {
				e.target.setSelectionRange(0, e.target.value.length);
				if (document.execCommand("copy")) {
					alert("Copied");
				}
			});
			</script>

		</label>
		<div>
			<h2>Preview:</h2>
			<iframe src="data:text/html;base64,"#;

const PAGE_TAIL: &str = r#""></iframe>
		</div>
	</body>
</html>
"#;

/// Writes the preview page for `body` to `writer`.
///
/// # Errors
/// Returns any I/O error raised by `writer`.
pub fn wrap_preview(body: &str, mut writer: impl Write) -> io::Result<()> {
    writer.write_all(PAGE_HEAD.as_bytes())?;
    writer.write_all(escape_html(body).as_bytes())?;
    writer.write_all(PAGE_MIDDLE.as_bytes())?;
    writer.write_all(STANDARD.encode(body).as_bytes())?;
    writer.write_all(PAGE_TAIL.as_bytes())?;
    Ok(())
}
