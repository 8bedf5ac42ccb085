//! HTML status page served on GET.

use chrono::{DateTime, Local};

/// Timestamp format shown on the status page and in the startup banner.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the status page for a server listening on `port`.
pub fn render(port: u16, now: DateTime<Local>) -> String {
    format!(
        r#"<html>
<head><title>Pushgate Webhook</title></head>
<body>
    <h1>Pushgate Webhook Server</h1>
    <p><strong>Status:</strong> Active</p>
    <p><strong>Port:</strong> {port}</p>
    <p><strong>Time:</strong> {time}</p>
    <p>Send POST request with GitHub webhook payload to trigger deployment.</p>
</body>
</html>
"#,
        time = now.format(TIME_FORMAT),
    )
}
