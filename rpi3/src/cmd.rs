use core::time::Duration;
use std::io::{self, Write};
use std::str::FromStr;
use std::thread;

use text_io::try_read;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use trach::device::ht16k33::MAX_VALUE;
use trach::device::vl6180x::Range;

use crate::error::BenchError;
use crate::init::{lights_out, Bench, BenchMutex};

const BLINK_FOR: Duration = Duration::from_secs(3);
/// 5 Hz
const BLINK_RATE: Duration = Duration::from_millis(100);
const WATCH_INTERVAL: Duration = Duration::from_millis(200);

pub fn list_cmds() {
    println!("range\nwatch\nnum\ntext\ncolon\nclear\nbright\nled\nblink\nbeat\nalarm\nservo\nclick\nhall\nems\nconf\n");
}

fn prompt(msg: &str) -> Option<String> {
    print!("{} > ", msg);
    let _ = io::stdout().flush();
    let line: Result<String, _> = try_read!("{}\n");
    line.ok().map(|l| l.trim().to_string())
}

fn prompt_parse<T: FromStr>(msg: &str) -> Option<T> {
    let line = prompt(msg)?;
    match line.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            println!("\tNot understood: {:?}", line);
            None
        }
    }
}

fn parse_switch(s: &str) -> Option<bool> {
    match s {
        "on" | "1" => Some(true),
        "off" | "0" => Some(false),
        _ => None,
    }
}

/// Reads commands from stdin on a plain thread, so a blocked read never
/// holds up the runtime on exit. `q` or end of input sends on `shutdown`.
pub fn manual_cmds(
    bench: BenchMutex,
    cancel: CancellationToken,
    shutdown: mpsc::UnboundedSender<bool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        loop {
            print!("(l)ist cmds, or (q)uit\n> ");
            let _ = io::stdout().flush();
            let line: String = match try_read!("{}\n") {
                Ok(line) => line,
                Err(_) => break,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if cancel.is_cancelled() {
                break;
            }
            match line {
                "l" => list_cmds(),
                "q" => break,
                cmd => {
                    if let Err(e) = run(cmd, &bench, &cancel) {
                        error!("{}: {}", cmd, e);
                    }
                }
            }
        }
        debug!("Cmd loop exit");
        let _ = shutdown.send(true);
    })
}

fn run(cmd: &str, bench: &BenchMutex, cancel: &CancellationToken) -> Result<(), BenchError> {
    match cmd {
        // Range sensor
        "range" => {
            let mut lock = bench.lock();
            let tof = lock
                .tof
                .as_mut()
                .ok_or_else(|| BenchError::new("no range sensor"))?;
            match tof.distance()? {
                Range::Ready(mm) => println!("\tDistance: {} mm", mm),
                Range::TimedOut(mm) => println!("\tDistance: {} mm (timed out, stale)", mm),
            }
        }
        "watch" => watch(bench, cancel)?,

        // Display
        "num" => {
            let Some(value) = prompt_parse::<i64>("Number 0-9999") else {
                return Ok(());
            };
            let mut lock = bench.lock();
            if !(0..=MAX_VALUE).contains(&value) {
                println!("\tOut of range: {}", value);
                lock.display.show_text("Err")?;
            } else {
                lock.display.show_number(value)?;
            }
        }
        "text" => {
            let Some(text) = prompt("Text, 1-4 chars") else {
                return Ok(());
            };
            bench.lock().display.show_text(&text)?;
        }
        "colon" => {
            let Some(on) = prompt("Colon on/off").as_deref().and_then(parse_switch) else {
                return Ok(());
            };
            bench.lock().display.set_colon(on)?;
        }
        "clear" => bench.lock().display.clear()?,
        "bright" => {
            let Some(level) = prompt_parse::<u8>("Brightness 0-15") else {
                return Ok(());
            };
            bench.lock().display.set_brightness(level)?;
        }

        // LEDs
        "led" => {
            let Some(name) = prompt("LED name") else {
                return Ok(());
            };
            let Some(action) = prompt("on/off/toggle") else {
                return Ok(());
            };
            let mut lock = bench.lock();
            let led = lock
                .leds
                .get_mut(&name)
                .ok_or_else(|| BenchError::new(&format!("no LED named {:?}", name)))?;
            match (action.as_str(), parse_switch(&action)) {
                ("toggle", _) => led.toggle()?,
                (_, Some(true)) => led.on()?,
                (_, Some(false)) => led.off()?,
                (s, None) => println!("\tNot understood: {:?}", s),
            }
        }
        "blink" => {
            let mut lock = bench.lock();
            let Bench { leds, delay, .. } = &mut *lock;
            let led = leds
                .get_mut("status")
                .ok_or_else(|| BenchError::new("no status LED"))?;
            led.blink(delay, BLINK_FOR, BLINK_RATE)?;
        }

        // PWM
        "beat" => {
            let mut lock = bench.lock();
            let Bench {
                heartbeat, delay, ..
            } = &mut *lock;
            heartbeat.heartbeat(delay)?;
        }
        "alarm" => {
            let mut lock = bench.lock();
            let Bench { alarm, delay, .. } = &mut *lock;
            alarm.alarm(delay)?;
        }
        "servo" => {
            let Some(position) = prompt_parse::<u8>("Servo position 0-100") else {
                return Ok(());
            };
            bench.lock().servo.turn(position)?;
        }

        // Inputs
        "click" => {
            println!("\tPress and release the start button");
            let mut lock = bench.lock();
            let Bench {
                start, delay, conf, ..
            } = &mut *lock;
            match start.wait_for_click(delay, conf.buttons.poll)? {
                Some(held) => println!("\tHeld for {} ms", held.as_millis()),
                None => println!("\tNo click within {} ms", conf.buttons.poll.budget_ms()),
            }
        }
        "hall" => {
            let lock = bench.lock();
            let near = lock.hall.is_pressed()?;
            println!("\tMagnet {}", if near { "near" } else { "away" });
        }
        "ems" => {
            let pressed = bench.lock().ems.is_pressed()?;
            println!("\tEmergency stop {}", if pressed { "pressed" } else { "released" });
        }
        "conf" => {
            let lock = bench.lock();
            match serde_json::to_string_pretty(&lock.conf) {
                Ok(json) => println!("{}", json),
                Err(e) => return Err(BenchError::new(&e.to_string())),
            }
        }

        _ => println!("\tUnknown command: {:?}", cmd),
    }
    Ok(())
}

/// Live range readout on the display until cancelled or the start button
/// is pressed. Red lights when blocked, green when clear.
fn watch(bench: &BenchMutex, cancel: &CancellationToken) -> Result<(), BenchError> {
    info!("Watching range, press start to stop");
    let mut last_blocked = None;
    while !cancel.is_cancelled() {
        {
            let mut lock = bench.lock();
            let Bench {
                tof,
                display,
                leds,
                start,
                conf,
                ..
            } = &mut *lock;
            let tof = tof
                .as_mut()
                .ok_or_else(|| BenchError::new("no range sensor"))?;

            let range = tof.distance()?;
            let blocked = range.within(conf.tof.blocked_mm);
            if range.is_timed_out() {
                println!("\tStale reading: {} mm", range.mm());
                display.show_text("----")?;
            } else {
                display.show_number(range.mm())?;
            }
            if last_blocked != Some(blocked) {
                println!("\t{}", if blocked { "BLOCKED" } else { "CLEAR" });
                if let Some(red) = leds.get_mut("red") {
                    if blocked { red.on()? } else { red.off()? }
                }
                if let Some(green) = leds.get_mut("green") {
                    if blocked { green.off()? } else { green.on()? }
                }
                last_blocked = Some(blocked);
            }

            if start.is_pressed()? {
                break;
            }
        }
        thread::sleep(WATCH_INTERVAL);
    }

    let mut lock = bench.lock();
    let Bench { display, leds, .. } = &mut *lock;
    lights_out(
        display,
        leds.iter_mut()
            .filter(|(name, _)| matches!(name.as_str(), "red" | "green"))
            .map(|(_, led)| led),
    )?;
    Ok(())
}
