//! Runs guest stubs against a synthetic host in one process and logs what comes back.

use std::{mem, path::PathBuf, ptr, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use thunklink::gate;
use winthunk_abi::types::*;
use winthunk_guest::user32;
use winthunk_host::{config::HostConfig, logging, runtime::HostRuntime, synthetic::SyntheticDisplay};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Host configuration file. Defaults to `$WINTHUNK_CONFIG`, then built-in defaults.
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Only enumerate monitors intersecting this rectangle, given as `left,top,right,bottom`.
    #[clap(long, value_parser = parse_rect)]
    clip: Option<Rect>,
}

fn parse_rect(text: &str) -> Result<Rect, String> {
    let parts = text
        .split(',')
        .map(|part| part.trim().parse::<i32>().map_err(|err| err.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    let &[left, top, right, bottom] = parts.as_slice() else {
        return Err(format!("expected four coordinates, got {}", parts.len()));
    };

    Ok(Rect {
        left,
        top,
        right,
        bottom,
    })
}

unsafe extern "system" fn collect_monitor(
    monitor: Hmonitor,
    _dc: Hdc,
    _rect: *mut Rect,
    param: LParam,
) -> Bool {
    let found = unsafe { &mut *(param as *mut Vec<Hmonitor>) };
    found.push(monitor);
    TRUE
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::from_env()?,
    };

    logging::init(&config.diagnostics);

    let runtime = HostRuntime::builder(config)
        .display(Arc::new(SyntheticDisplay::default()))
        .build()
        .context("failed to assemble the loopback host")?;

    gate::install(runtime.gate())?;

    let clip = args.clip.as_ref().map_or(ptr::null(), |clip| clip as *const Rect);
    let mut found = Vec::<Hmonitor>::new();

    let status = unsafe {
        user32::enum_display_monitors(
            ptr::null_mut(),
            clip,
            Some(collect_monitor),
            &mut found as *mut Vec<Hmonitor> as LParam,
        )
    };

    tracing::info!(status, count = found.len(), "enumerated monitors");

    for monitor in found {
        let mut info = MonitorInfo {
            cb_size: mem::size_of::<MonitorInfo>() as u32,
            ..Default::default()
        };

        if unsafe { user32::get_monitor_info_w(monitor, &mut info) } == FALSE {
            tracing::warn!(?monitor, "GetMonitorInfoW failed");
            continue;
        }

        tracing::info!(
            ?monitor,
            monitor_rect = ?info.rc_monitor,
            work_rect = ?info.rc_work,
            primary = info.flags & MONITORINFOF_PRIMARY != 0,
            "monitor"
        );
    }

    Ok(())
}
