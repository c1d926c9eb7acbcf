//! `ctl` command handler - sends requests to the running recorder via IPC

use super::args::CtlAction;
use super::ipc::{create_ipc_client, IpcClient};
use super::presenter::Presenter;

/// Handle ctl subcommand
pub async fn handle_ctl_command(action: CtlAction, presenter: &Presenter) -> Result<(), String> {
    let client = create_ipc_client();
    run_ctl(client.as_ref(), action, presenter).await
}

async fn run_ctl(
    client: &dyn IpcClient,
    action: CtlAction,
    presenter: &Presenter,
) -> Result<(), String> {
    if !client.is_recorder_running() {
        return Err("No recorder running. Start one with: screen-recorder".to_string());
    }

    if action == CtlAction::Watch {
        return client
            .watch(&mut |line: &str| presenter.output(line))
            .await
            .map_err(|e| format!("Lost connection to recorder: {}", e));
    }

    let request = action.request();
    let response = client
        .send_command(request)
        .await
        .map_err(|e| format!("Failed to communicate with recorder: {}", e))?;
    let response = response.trim();

    if let Some(stripped) = response.strip_prefix("error:") {
        return Err(stripped.trim().to_string());
    }

    match action {
        CtlAction::Status => presenter.output(response),
        CtlAction::Save => match response.strip_prefix("saved ") {
            Some(path) => {
                presenter.success("Recording saved");
                presenter.output(path);
            }
            None => return Err(format!("Unexpected reply: {}", response)),
        },
        _ => presenter.info(&format!("Command sent: {}", request)),
    }

    Ok(())
}
