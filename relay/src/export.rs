use std::fmt::Write as _;
use std::net::SocketAddr;

use crate::args::Shell;

/// Local URL clients should use to reach the gateway
pub fn base_url(listen: SocketAddr) -> String {
    format!("http://localhost:{}", listen.port())
}

/// Render `ANTHROPIC_BASE_URL` and `ANTHROPIC_API_KEY` assignments
pub fn render(shell: Shell, base_url: &str, api_key: &str) -> String {
    match shell {
        Shell::Posix => format!("export ANTHROPIC_BASE_URL={base_url}\nexport ANTHROPIC_API_KEY=\"{api_key}\"\n"),
        Shell::Cmd => format!("set ANTHROPIC_BASE_URL={base_url}\nset ANTHROPIC_API_KEY={api_key}\n"),
        Shell::Powershell => {
            format!("$env:ANTHROPIC_BASE_URL=\"{base_url}\"\n$env:ANTHROPIC_API_KEY=\"{api_key}\"\n")
        }
    }
}

/// Render for an explicit shell, or for the platform's usual shells
pub fn render_for(shell: Option<Shell>, base_url: &str, api_key: &str) -> String {
    match shell {
        Some(shell) => render(shell, base_url, api_key),
        None if cfg!(windows) => {
            let mut out = String::from("CMD\n");
            out.push_str(&render(Shell::Cmd, base_url, api_key));
            let _ = write!(out, "\nPowershell\n{}", render(Shell::Powershell, base_url, api_key));
            out
        }
        None => render(Shell::Posix, base_url, api_key),
    }
}
