use axum::extract::State;
use axum::response::Html;
use chrono::Utc;

use livecap_common::config::DEFAULT_INTERVAL_SECS;

use crate::AppState;

/// GET /viewer
///
/// Refreshes at the configured capture interval, or every
/// [`DEFAULT_INTERVAL_SECS`] when nothing is configured.
pub async fn get_viewer(State(state): State<AppState>) -> Html<String> {
    let refresh_ms = state
        .scheduler
        .config()
        .map(|c| c.interval().as_millis() as u64)
        .unwrap_or((DEFAULT_INTERVAL_SECS * 1000.0) as u64)
        .max(1);

    tracing::debug!(refresh_ms, "Viewer requested");
    Html(render(refresh_ms, Utc::now().timestamp_millis()))
}

fn render(refresh_ms: u64, now_ms: i64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Live Screenshot Viewer</title>
    <style>
        body {{
            display: flex;
            justify-content: center;
            align-items: center;
            height: 100vh;
            margin: 0;
            background-color: #f0f0f0;
        }}
        img {{
            max-width: 90%;
            max-height: 90%;
            border: 2px solid #ccc;
            box-shadow: 0 0 10px rgba(0, 0, 0, 0.5);
        }}
    </style>
</head>
<body>
    <img id="screenshot" src="/screenshot?timestamp={now_ms}" alt="Latest Screenshot">
    <script>
        function refreshImage() {{
            var img = document.getElementById('screenshot');
            img.src = '/screenshot?timestamp=' + new Date().getTime();
        }}
        setInterval(refreshImage, {refresh_ms});
    </script>
</body>
</html>
"#
    )
}
