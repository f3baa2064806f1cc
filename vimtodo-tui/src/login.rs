use anyhow::{bail, Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::api::dto::PasswordLoginRequest;
use crate::api::SESSION_COOKIE;

const TUI_CALLBACK_PORT: u16 = 9876;

/// Browser login through the server's OAuth provider:
/// 1. Start a local HTTP listener on localhost:9876
/// 2. POST to vimtodo-api /login?next=http://localhost:9876/callback
/// 3. Open the returned authorization URL in the system browser
/// 4. Wait for the browser to come back with ?session_id=<value>
/// 5. Save the session ID and return it
pub async fn run_oauth_login(api_url: &str) -> Result<String> {
    let callback_url = format!("http://localhost:{}/callback", TUI_CALLBACK_PORT);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", TUI_CALLBACK_PORT))
        .await
        .with_context(|| format!("Failed to bind to port {}", TUI_CALLBACK_PORT))?;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/login", api_url.trim_end_matches('/')))
        .query(&[("next", &callback_url)])
        .send()
        .await
        .context("Failed to call /login on vimtodo-api. Is vimtodo-api running?")?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        bail!("This server has no browser login configured. Use `vimtodo login --password`.");
    }
    let auth_url = response
        .error_for_status()
        .context("POST /login returned error")?
        .text()
        .await
        .context("Failed to read /login response")?;

    println!("Opening browser for login...");
    println!("If the browser doesn't open, visit:\n  {}\n", auth_url);
    open_browser(&auth_url);

    let session_id = wait_for_callback(listener).await?;

    crate::session_store::save_session(&session_id)?;
    println!("Login successful. Session saved.");

    Ok(session_id)
}

/// Email and password login against POST /login/password.
pub async fn run_password_login(api_url: &str, email: Option<String>) -> Result<String> {
    let email = match email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    let client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .context("Failed to build HTTP client")?;
    let response = client
        .post(format!("{}/login/password", api_url.trim_end_matches('/')))
        .json(&PasswordLoginRequest {
            email: email.trim(),
            password: &password,
        })
        .send()
        .await
        .context("Failed to call /login/password on vimtodo-api. Is vimtodo-api running?")?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
        bail!("Invalid email or password");
    }
    let response = response
        .error_for_status()
        .context("POST /login/password returned error")?;

    let session_id = response
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .context("Server did not return a session cookie")?;

    crate::session_store::save_session(&session_id)?;
    println!("Login successful. Session saved.");

    Ok(session_id)
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;

    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

/// Open a URL in the system default browser.
fn open_browser(url: &str) {
    #[cfg(target_os = "linux")]
    let _ = std::process::Command::new("xdg-open").arg(url).spawn();
    #[cfg(target_os = "macos")]
    let _ = std::process::Command::new("open").arg(url).spawn();
    #[cfg(target_os = "windows")]
    let _ = std::process::Command::new("cmd")
        .args(["/c", "start", url])
        .spawn();
}

/// Wait for one request to /callback?session_id=<value> and return the session_id.
async fn wait_for_callback(listener: tokio::net::TcpListener) -> Result<String> {
    println!(
        "Waiting for browser callback on port {}...",
        TUI_CALLBACK_PORT
    );

    let (mut stream, _) = listener
        .accept()
        .await
        .context("Failed to accept connection")?;

    let mut buf = vec![0u8; 4096];
    let n = stream
        .read(&mut buf)
        .await
        .context("Failed to read from socket")?;
    let request = String::from_utf8_lossy(&buf[..n]);

    let session_id = parse_session_id(&request)
        .context("Callback did not contain session_id. Login may have failed.")?;

    let response = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
        <html><body><h2>Login successful!</h2><p>You can close this tab.</p></body></html>";
    stream
        .write_all(response.as_bytes())
        .await
        .context("Failed to write response")?;

    Ok(session_id)
}

/// Pull `session_id` out of a request line like
/// "GET /callback?session_id=abc-123&foo=bar HTTP/1.1".
fn parse_session_id(request: &str) -> Option<String> {
    let line = request.lines().next()?;
    let path = line.split_whitespace().nth(1)?;
    let query = path.split_once('?')?.1;
    query.split('&').find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name != "session_id" || value.is_empty() {
            return None;
        }
        urlencoding::decode(value).ok().map(|v| v.into_owned())
    })
}
