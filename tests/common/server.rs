//! Test server management.
//!
//! Spawns and manages portald instances for integration testing.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

/// Secret written into every test config.
pub const TEST_SECRET: &str = "integration-test-secret-0123456789";

/// A test server instance.
pub struct TestServer {
    child: Child,
    plaintext_port: u16,
    _dir: TempDir,
}

impl TestServer {
    /// Spawn a server with both listeners on free local ports.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(&[]).await
    }

    /// Spawn a server whose config also carries the given MOTD lines.
    pub async fn spawn_with(motd: &[&str]) -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let ws_port = free_port()?;
        let plaintext_port = free_port()?;

        let motd_lines = motd
            .iter()
            .map(|l| format!("{l:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        let config_path = dir.path().join("config.toml");
        let config_content = format!(
            r#"
[server]
name = "test.portald"
metrics_port = 0

[listen]
address = "127.0.0.1:{ws_port}"

[plaintext]
address = "127.0.0.1:{plaintext_port}"

[auth]
secret = "{TEST_SECRET}"

[limits]
max_line_length = 256

[motd]
lines = [{motd_lines}]

[logging]
level = "warn"
"#
        );
        std::fs::write(&config_path, config_content)?;

        let child = Command::new(env!("CARGO_BIN_EXE_portald"))
            .arg(&config_path)
            .stdout(Stdio::null())
            .spawn()?;

        let server = Self {
            child,
            plaintext_port,
            _dir: dir,
        };

        // Wait for server to start listening
        server.wait_until_ready().await?;

        Ok(server)
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(self.address()).await.is_ok() {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 5 seconds")
    }

    /// Address of the plain TCP listener.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.plaintext_port)
    }

    /// Connect as `username` with a validly signed token and wait for the
    /// welcome notice.
    pub async fn login(&self, username: &str) -> anyhow::Result<super::client::TestClient> {
        let mut client = super::client::TestClient::connect(&self.address()).await?;
        client.send_line(&mint_token(username)).await?;
        client
            .expect(&format!("* Connected as user: {username}"))
            .await?;
        Ok(client)
    }

    /// Connect without sending anything.
    pub async fn connect(&self) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(&self.address()).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Sign `username` the way the server does.
pub fn mint_token(username: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SECRET.as_bytes()).unwrap();
    mac.update(username.as_bytes());
    let signature = mac.finalize().into_bytes();
    format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(username.as_bytes()),
        URL_SAFE_NO_PAD.encode(signature)
    )
}

fn free_port() -> std::io::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
