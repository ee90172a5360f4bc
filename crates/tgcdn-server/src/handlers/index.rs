use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html("<html><body><h1>tgcdn</h1><p>POST /upload, GET /content/&lt;file_uuid&gt;</p></body></html>")
}
