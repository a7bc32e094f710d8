use axum::response::Html;

const BODY: &str = r#"<!doctype html>
<html>
    <head>
        <meta charset="UTF-8">
        <title>Loyalty points service</title>
    </head>
    <body>
        <h1>Loyalty points service</h1>
        <p>This service exposes the HTTP API of a loyalty-points program.</p>
    </body>
</html>
"#;

pub async fn index() -> Html<&'static str> {
    Html(BODY)
}
