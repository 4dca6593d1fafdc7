use clap::{value_t, App, Arg};
use colored::*;
use framefix::host::{Clock, PedHandle, VehicleHandle};
use framefix::sim::{HostCall, SimHost};
use framefix::{Config, FrameDriver};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time;
use tracing::info;

// 60 Hz host
const FRAME_MS: u64 = 16;
const DEFAULT_FRAMES: u64 = 600;
const PERIODIC_SCENARIO_INTERVAL_MS: u64 = 2_000;

const SIM_PLAYER: PedHandle = PedHandle(1);
const SIM_VEHICLE: VehicleHandle = VehicleHandle(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scenario {
    Repair,
    Periodic,
    Toggle,
}

impl Scenario {
    fn parse(name: &str) -> Self {
        match name {
            "periodic" => Scenario::Periodic,
            "toggle" => Scenario::Toggle,
            _ => Scenario::Repair,
        }
    }

    /// Shortens the periodic interval so the first fire lands inside the run.
    fn adjust_config(self, config: &mut Config) {
        if self == Scenario::Periodic {
            config.repair.periodic_interval_ms = PERIODIC_SCENARIO_INTERVAL_MS;
        }
    }

    fn setup(self, host: &mut SimHost) {
        match self {
            Scenario::Repair => host.set_phone_open(true),
            Scenario::Periodic => host.set_phone_open(false),
            Scenario::Toggle => {
                host.set_player(Some(SIM_PLAYER));
                host.set_vehicle(Some(SIM_VEHICLE));
                host.set_engine_running(SIM_VEHICLE, true);
            }
        }
    }

    /// Scripted host events for `frame`, applied before the controllers run.
    fn before_frame(self, frame: u64, host: &mut SimHost, driver: &mut FrameDriver<SimHost>, config: &Config) {
        match (self, frame) {
            (Scenario::Repair, 10) => {
                info!("typing repair phrase");
                host.enter_phrase(&config.repair.trigger_phrase);
            }
            (Scenario::Toggle, 5) => {
                info!(key = %config.engine.toggle_key, "pressing toggle key");
                driver.key_up(host, config.engine.toggle_key);
            }
            (Scenario::Toggle, 90) => {
                info!("engine restarted natively");
                host.set_engine_running(SIM_VEHICLE, true);
            }
            _ => {}
        }
    }
}

fn call_label(call: &HostCall) -> &'static str {
    match call {
        HostCall::ClosePhone => "close_phone",
        HostCall::TerminateScript(_) => "terminate_script",
        HostCall::RequestScript(_) => "request_script",
        HostCall::StartScript(..) => "start_script",
        HostCall::ReleaseScript(_) => "release_script",
        HostCall::DestroyPhone => "destroy_phone",
        HostCall::CreatePhone(_) => "create_phone",
        HostCall::RequestTextureDict(_) => "request_texture_dict",
        HostCall::RequestMovie(_) => "request_movie",
        HostCall::ShowNotice(_) => "show_notice",
        HostCall::EnableControl(_) => "enable_control",
        HostCall::SetEngineOn(..) => "set_engine_on",
        HostCall::RequestAnimDict(_) => "request_anim_dict",
        HostCall::PlayAnim(..) => "play_anim",
    }
}

fn print_summary(host: &SimHost, driver: &FrameDriver<SimHost>) -> Result<(), serde_json::Error> {
    let mut tally: BTreeMap<&str, usize> = BTreeMap::new();
    for call in host.calls() {
        *tally.entry(call_label(call)).or_insert(0) += 1;
    }

    println!();
    println!("{}", "Host calls".bold().cyan());
    for (label, count) in &tally {
        println!("  {:<22} {}", label, count.to_string().yellow());
    }

    println!("{}", "Notices".bold().cyan());
    for notice in host.notices() {
        println!("  {}", notice.green());
    }

    println!("{}", "Controllers".bold().cyan());
    println!("{}", serde_json::to_string_pretty(&driver.snapshot())?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let matches = App::new("framefix-sim")
        .version("0.1.0")
        .about("Drives the frame controllers against a scripted host")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON config file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("scenario")
                .short("s")
                .long("scenario")
                .value_name("SCENARIO")
                .help("Scripted host behaviour")
                .takes_value(true)
                .possible_values(&["repair", "periodic", "toggle"])
                .default_value("repair"),
        )
        .arg(
            Arg::with_name("frames")
                .short("n")
                .long("frames")
                .value_name("COUNT")
                .help("Number of frames to run")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("interval")
                .long("interval")
                .value_name("MS")
                .help("Override the periodic repair interval")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("fast")
                .long("fast")
                .help("Run frames back to back instead of at 60 Hz"),
        )
        .get_matches();

    let scenario = Scenario::parse(matches.value_of("scenario").unwrap_or("repair"));

    let mut config = match matches.value_of("config") {
        Some(path) => Config::load_or_default(path),
        None => Config::default(),
    };
    scenario.adjust_config(&mut config);
    if matches.is_present("interval") {
        config.repair.periodic_interval_ms = value_t!(matches, "interval", u64).unwrap_or_else(|e| e.exit());
    }

    let frames = if matches.is_present("frames") {
        value_t!(matches, "frames", u64).unwrap_or_else(|e| e.exit())
    } else {
        DEFAULT_FRAMES
    };
    let fast = matches.is_present("fast");

    println!("{} {:?}, {} frames", "framefix-sim".bold(), scenario, frames);

    let mut host = SimHost::new();
    scenario.setup(&mut host);
    let mut driver: FrameDriver<SimHost> = FrameDriver::from_config(&config, host.now_ms());

    let mut interval = time::interval(Duration::from_millis(FRAME_MS));
    for frame in 0..frames {
        if !fast {
            interval.tick().await;
        }
        scenario.before_frame(frame, &mut host, &mut driver, &config);
        driver.tick(&mut host);
        host.advance(FRAME_MS);
    }

    print_summary(&host, &driver)?;
    Ok(())
}
