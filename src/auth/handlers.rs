//! OAuth2 HTTP Handlers
//!
//! Endpoints HTTP para iniciar e completar o sign-up via Blackbaud

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use blackbaud::CallbackQuery;

use crate::utils::logging::*;
use crate::AppState;

/// Cookie que liga o navegador à tentativa pendente
pub const ATTEMPT_COOKIE: &str = "signup_attempt";

/// GET /sign-up
///
/// Inicia uma tentativa e redireciona (303) para a página de autorização do
/// Blackbaud, gravando o id da tentativa num cookie HttpOnly.
pub async fn sign_up(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    let start = state.redirector.begin().await;

    let cookie = Cookie::build((ATTEMPT_COOKIE, start.attempt_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.settings.server.cookie_secure);

    (jar.add(cookie), Redirect::to(start.authorization_url.as_str()))
}

/// GET <redirect_uri>?code=XXX&state=YYY
///
/// Recebe o retorno do Blackbaud. O cookie da tentativa é sempre removido.
///
/// # Retorno
/// - `200`: página de sucesso
/// - `4xx/5xx`: página de erro (ver `AuthFlowError::status_code`)
pub async fn redirect_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> (CookieJar, Response) {
    log_info("📥 [OAuth2] Callback recebido");

    let attempt_id = jar.get(ATTEMPT_COOKIE).map(|c| c.value().to_string());
    let report = match query {
        Ok(Query(query)) => state.callback.handle(attempt_id.as_deref(), query).await,
        Err(rejection) => {
            state
                .callback
                .handle_unparseable(attempt_id.as_deref(), &rejection.body_text())
                .await
        }
    };

    let jar = jar.remove(Cookie::build((ATTEMPT_COOKIE, "")).path("/"));

    let response = match report.outcome {
        Ok(_) => (StatusCode::OK, render_success_page()).into_response(),
        Err(e) => e.into_response(),
    };

    (jar, response)
}

/// Página de sucesso
pub fn render_success_page() -> Html<String> {
    render_message_page(
        "Sign-up complete",
        "Your Blackbaud account is connected. You can close this window.",
        false,
    )
}

/// Página simples de mensagem; `message` é texto fixo, nunca dado do provedor
pub fn render_message_page(title: &str, message: &str, is_error: bool) -> Html<String> {
    let (color, retry) = if is_error {
        ("#721c24", r#"<p><a href="/sign-up">Start sign-up again</a></p>"#)
    } else {
        ("#155724", "")
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Arial, sans-serif;
               max-width: 600px; margin: 50px auto; padding: 20px; }}
        h1 {{ color: {color}; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <p>{message}</p>
    {retry}
</body>
</html>
"#
    ))
}
