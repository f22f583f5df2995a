use playtune::catalog::InstrumentId;
use playtune::generator::fixed::UNITY;
use playtune::generator::{Envelope, EnvelopeStage, GeneratorState, SignalGenerator};
use playtune::{Catalog, EnvelopeShape};
use plotters::prelude::*;
use tracing::debug;

const SAMPLE_RATE: u32 = 1000; // 1ms = 1 sample
const FRAME_SIZE: usize = 64;
const MAX_SAMPLES: usize = 100_000;
const DISCONTINUITY_THRESHOLD: f32 = 0.15;

struct Args {
    title: String,
    shape: EnvelopeShape,
    note_off_ms: u32,
    output_path: String,
}

fn print_usage() {
    eprintln!("Usage: plot-envelope <instrument> <note_off_ms> <output.svg>");
    eprintln!("       plot-envelope <delay_ms> <attack_ms> <hold_ms> <decay_ms> <sustain_level> <release_ms> <note_off_ms> <output.svg>");
    eprintln!();
    eprintln!("Instruments:");
    for id in InstrumentId::ALL {
        eprintln!("  {}", id.name());
    }
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  plot-envelope piano 200 piano.svg");
    eprintln!("  plot-envelope 10 100 20 200 0.7 300 640 output.svg");
    eprintln!("  plot-envelope 0 50 0 100 0.5 200 30 output.svg    # release during attack");
}

fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    match args.len() {
        4 => {
            let id = InstrumentId::ALL
                .into_iter()
                .find(|id| id.name() == args[1])
                .ok_or_else(|| format!("Unknown instrument: {}", args[1]))?;
            let catalog = Catalog::builtin(SAMPLE_RATE);
            let instrument = catalog
                .instrument(id as u8)
                .ok_or("Instrument missing from catalog")?;
            Ok(Args {
                title: format!("{} envelope", instrument.name),
                shape: instrument.envelope,
                note_off_ms: args[2].parse()?,
                output_path: args[3].clone(),
            })
        }
        9 => {
            let mut ms = [0u32; 5];
            for (slot, arg) in ms.iter_mut().zip(&args[1..5]) {
                *slot = arg.parse()?;
            }
            let sustain: f64 = args[5].parse()?;
            if !(0.0..=1.0).contains(&sustain) {
                return Err("Sustain level must be between 0.0 and 1.0".into());
            }
            ms[4] = args[6].parse()?;
            let [delay, attack, hold, decay, release] = ms;
            Ok(Args {
                title: format!(
                    "DAHDSR: D={}ms, A={}ms, H={}ms, D={}ms, S={:.2}, R={}ms",
                    delay, attack, hold, decay, sustain, release
                ),
                shape: EnvelopeShape::from_ms(ms, sustain, SAMPLE_RATE),
                note_off_ms: args[7].parse()?,
                output_path: args[8].clone(),
            })
        }
        _ => {
            print_usage();
            Err("Invalid number of arguments".into())
        }
    }
}

/// Render the envelope with a note-off at `note_off_ms`
fn generate_envelope(args: &Args) -> Result<(Vec<f32>, Vec<EnvelopeStage>), Box<dyn std::error::Error>> {
    let mut envelope = Envelope::new(args.shape);
    envelope.note_on(args.shape);

    let note_off_sample = (args.note_off_ms as u64 * SAMPLE_RATE as u64 / 1000) as usize;
    debug!(shape = ?args.shape, note_off_sample, "envelope started");
    let mut samples = Vec::new();
    let mut stages = Vec::new();
    let mut frame = [0i32; FRAME_SIZE];
    let mut note_off_triggered = false;

    loop {
        // Split the frame at the note-off sample
        let len = if note_off_triggered {
            FRAME_SIZE
        } else {
            (note_off_sample - samples.len()).min(FRAME_SIZE)
        };
        if len == 0 {
            envelope.note_off();
            note_off_triggered = true;
            continue;
        }

        let stage = envelope.stage();
        let state = envelope.process(&mut frame[..len]);
        samples.extend(frame[..len].iter().map(|&g| g as f32 / UNITY as f32));
        stages.extend(std::iter::repeat(stage).take(len));

        if state == GeneratorState::Complete && note_off_triggered {
            debug!(samples = samples.len(), "envelope complete");
            break;
        }
        if samples.len() > MAX_SAMPLES {
            return Err("Envelope exceeded maximum duration".into());
        }
    }

    Ok((samples, stages))
}

fn check_discontinuities(samples: &[f32]) -> Result<(), Box<dyn std::error::Error>> {
    let mut max_diff: f32 = 0.0;
    let mut max_diff_idx: usize = 0;

    for i in 1..samples.len() {
        let diff = (samples[i] - samples[i - 1]).abs();
        if diff > max_diff {
            max_diff = diff;
            max_diff_idx = i;
        }
    }

    if max_diff > DISCONTINUITY_THRESHOLD {
        // Steps are expected where a stage is shorter than a sample
        println!(
            "  ! Step of {:.3} at {}ms (attack or decay shorter than 1ms?)",
            max_diff, max_diff_idx
        );
    } else {
        println!(
            "  ✓ Max step: {:.6} at sample {} (below threshold {})",
            max_diff, max_diff_idx, DISCONTINUITY_THRESHOLD
        );
    }
    Ok(())
}

fn create_plot(args: &Args, samples: &[f32], stages: &[EnvelopeStage]) -> Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(&args.output_path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_time = samples.len().saturating_sub(1).max(1) as f32;

    let mut chart = ChartBuilder::on(&root)
        .caption(&args.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f32..max_time, 0f32..1.1f32)?;

    chart
        .configure_mesh()
        .x_desc("Time (ms)")
        .y_desc("Gain")
        .x_labels(10)
        .y_labels(10)
        .draw()?;

    chart.draw_series(LineSeries::new(
        samples.iter().enumerate().map(|(i, &s)| (i as f32, s)),
        BLUE.stroke_width(2),
    ))?;

    // Stage transitions
    for (i, pair) in stages.windows(2).enumerate() {
        if pair[0] != pair[1] {
            chart.draw_series(std::iter::once(plotters::element::Cross::new(
                ((i + 1) as f32, 0.5),
                8,
                BLACK.filled(),
            )))?;
        }
    }

    let note_off = args.note_off_ms as f32;
    let level = samples
        .get(args.note_off_ms as usize)
        .copied()
        .unwrap_or(0.0);
    chart.draw_series(std::iter::once(plotters::element::Circle::new(
        (note_off, level),
        5,
        RED.filled(),
    )))?;

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = parse_args()?;

    println!("Envelope Plot Generator");
    println!("=======================");
    println!("  {}", args.title);
    println!("  Note Off: {}ms", args.note_off_ms);
    println!();

    print!("  Generating envelope... ");
    let (samples, stages) = generate_envelope(&args)?;
    println!("done ({} samples)", samples.len());

    // Release starts at the note-off sample; the last frame is padded
    let expected = args.note_off_ms as usize + args.shape.release as usize;
    if samples.len() < expected || samples.len() > expected + FRAME_SIZE {
        return Err(format!(
            "Duration mismatch: expected {}ms but got {}ms",
            expected,
            samples.len()
        )
        .into());
    }
    println!("  ✓ Duration matches expected");

    check_discontinuities(&samples)?;

    print!("  Creating plot... ");
    create_plot(&args, &samples, &stages)?;
    println!("done");

    println!();
    println!("Output: {}", args.output_path);

    Ok(())
}
