use crate::app::ports::ViewerPort;
use async_trait::async_trait;
use tokio::process::Command;

/// Opens locations with the platform's default handler.
pub struct SystemBrowser;

fn opener(url: &str) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", "", url]);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    }
}

#[async_trait]
impl ViewerPort for SystemBrowser {
    async fn open(&self, url: &str) -> Result<(), String> {
        let status = opener(url).status().await.map_err(|e| e.to_string())?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("opener exited with {}", status))
        }
    }
}
