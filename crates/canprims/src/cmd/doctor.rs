use canprims_transport::{CanSocket, EndpointConfig, TransportError};
use serde::Serialize;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    interface: String,
    checks: Vec<CheckResult>,
    overall: &'static str,
}

/// Endpoint setup steps, in the order `CanSocket::open` runs them.
const STEPS: [&str; 5] = ["socket", "resolve", "fd_frames", "filter", "bind"];

pub fn run(args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.endpoint.to_config();
    let mut checks = vec![platform_check()];
    checks.extend(endpoint_checks(&config, CanSocket::open(config.clone())));

    let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
    let output = DoctorOutput {
        interface: config.interface,
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn platform_check() -> CheckResult {
    CheckResult {
        name: "platform",
        status: CheckStatus::Info,
        detail: format!(
            "{}/{}, SocketCAN raw sockets",
            std::env::consts::OS,
            std::env::consts::ARCH
        ),
    }
}

/// Turn the outcome of one open attempt into a result per setup step.
///
/// Steps before the failing one passed, steps after it never ran.
fn endpoint_checks(
    config: &EndpointConfig,
    opened: Result<CanSocket, TransportError>,
) -> Vec<CheckResult> {
    let failure = opened.err().map(|err| (failed_step(&err), err.to_string()));

    let mut reached_failure = false;
    STEPS
        .iter()
        .map(|&name| {
            let status;
            let detail;
            if reached_failure {
                status = CheckStatus::Skip;
                detail = "not reached".to_string();
            } else if !step_enabled(name, config) {
                status = CheckStatus::Skip;
                detail = "not configured".to_string();
            } else if let Some((_, cause)) = failure.as_ref().filter(|(step, _)| *step == name) {
                reached_failure = true;
                status = CheckStatus::Fail;
                detail = cause.clone();
            } else {
                status = CheckStatus::Pass;
                detail = pass_detail(name, config);
            }
            CheckResult {
                name,
                status,
                detail,
            }
        })
        .collect()
}

fn failed_step(err: &TransportError) -> &'static str {
    match err {
        TransportError::Open(_) | TransportError::Io(_) => "socket",
        TransportError::Resolution { .. } => "resolve",
        TransportError::Capability { option, .. } if *option == "CAN_RAW_FILTER" => "filter",
        TransportError::InvalidFilter { .. } => "filter",
        TransportError::Capability { .. } => "fd_frames",
        TransportError::Bind { .. } => "bind",
    }
}

fn step_enabled(name: &str, config: &EndpointConfig) -> bool {
    match name {
        "fd_frames" => config.fd_frames,
        "filter" => config.filter.is_some(),
        _ => true,
    }
}

fn pass_detail(name: &str, config: &EndpointConfig) -> String {
    match name {
        "socket" => "PF_CAN raw socket created".to_string(),
        "resolve" => format!("{} resolved", config.interface),
        "fd_frames" => "CAN_RAW_FD_FRAMES enabled".to_string(),
        "filter" => match config.filter {
            Some(rule) => format!("id {:#x} mask {:#x}", rule.id, rule.mask),
            None => String::new(),
        },
        _ => format!("bound to {}", config.interface),
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty | OutputFormat::Cansend => {
            println!("canprims doctor ({})\n", output.interface);
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<10} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}
