use colored::Colorize;

use crate::server::ProcessesResponse;

const INFO_WIDTH: usize = 40;

fn truncate(value: &str, width: usize) -> String {
    let flat = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= width {
        flat
    } else {
        let mut cut: String = flat.chars().take(width.saturating_sub(3)).collect();
        cut.push_str("...");
        cut
    }
}

#[allow(clippy::too_many_arguments)]
pub(super) fn format_row(
    id: &str,
    user: &str,
    db: &str,
    command: &str,
    time: &str,
    pid: &str,
    host: &str,
    cmdline: &str,
    info: &str,
) -> String {
    format!(
        "{:<8} {:<12} {:<12} {:<8} {:>6} {:>8} {:<20} {:<30} {}",
        id,
        user,
        db,
        command,
        time,
        pid,
        host,
        truncate(cmdline, 30),
        truncate(info, INFO_WIDTH)
    )
}

pub(super) fn print_processes(response: &ProcessesResponse) {
    let header = format_row(
        "ID", "USER", "DB", "COMMAND", "TIME", "PID", "HOST", "CMDLINE", "INFO",
    );
    println!("{}", header.bold());

    for process in &response.processes {
        println!(
            "{}",
            format_row(
                &process.id.to_string(),
                &process.mysql_user,
                process.db.as_deref().unwrap_or("-"),
                &process.command,
                &process.time.to_string(),
                &process.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
                process.host.as_deref().unwrap_or("-"),
                &process.cmdline.join(" "),
                process.info.as_deref().unwrap_or(""),
            )
        );
    }

    println!("\n{} processes", response.processes.len());
}
