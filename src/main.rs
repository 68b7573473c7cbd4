use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use probe_nn::diagnostics::compare_dirs;
use probe_nn::train::evaluate;
use probe_nn::{train_network, Dataset, NetworkSpec, NullSink, Split, TrainConfig, TxtDirSink};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on a seeded synthetic dataset, optionally dumping every step
    Train {
        /// Network spec JSON; defaults to the reference 256-128 MLP
        #[arg(long)]
        spec: Option<String>,
        #[arg(long, default_value_t = 1024)]
        samples: usize,
        #[arg(long, default_value_t = 784)]
        features: usize,
        #[arg(long, default_value_t = 10)]
        classes: usize,
        #[arg(long, default_value_t = 1)]
        epochs: usize,
        #[arg(long, default_value_t = 128)]
        batch_size: usize,
        /// Stop each epoch after this many minibatches
        #[arg(long)]
        max_batches: Option<usize>,
        #[arg(long, default_value_t = 1e-3)]
        learning_rate: f64,
        /// SGD momentum; 0 is plain SGD
        #[arg(long, default_value_t = 0.0)]
        momentum: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Directory for per-step diagnostic text files
        #[arg(long)]
        dump_dir: Option<PathBuf>,
        /// Write the trained network here as JSON
        #[arg(long)]
        save: Option<String>,
    },
    /// Report the max abs difference between same-named dumps in two directories
    Compare {
        left: PathBuf,
        right: PathBuf,
        /// File names to compare; every .txt in LEFT when omitted
        names: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Train {
            spec,
            samples,
            features,
            classes,
            epochs,
            batch_size,
            max_batches,
            learning_rate,
            momentum,
            seed,
            dump_dir,
            save,
        } => train(TrainArgs {
            spec,
            samples,
            features,
            classes,
            epochs,
            batch_size,
            max_batches,
            learning_rate,
            momentum,
            seed,
            dump_dir,
            save,
        }),
        Commands::Compare { left, right, names } => compare(left, right, names),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

struct TrainArgs {
    spec: Option<String>,
    samples: usize,
    features: usize,
    classes: usize,
    epochs: usize,
    batch_size: usize,
    max_batches: Option<usize>,
    learning_rate: f64,
    momentum: f64,
    seed: u64,
    dump_dir: Option<PathBuf>,
    save: Option<String>,
}

fn train(args: TrainArgs) -> probe_nn::Result<()> {
    let spec = match &args.spec {
        Some(path) => NetworkSpec::load_json(path)?,
        None => NetworkSpec {
            momentum: args.momentum,
            ..NetworkSpec::reference_mlp(args.features, args.classes, args.learning_rate, args.seed)
        },
    };
    let mut network = spec.build()?;

    // Data gets its own stream so the parameters depend on the spec seed only.
    let mut data_rng = ChaCha8Rng::seed_from_u64(args.seed.wrapping_add(1));
    let all = Split::gaussian_clusters(args.samples, args.features, args.classes, 0.5, &mut data_rng)?;
    let (rest, test) = all.split_tail(args.samples / 10)?;
    let (train, val) = rest.split_tail(args.samples / 10)?;
    println!("[TRAIN] len: {}", train.len());
    println!("[VAL] len: {}", val.len());
    println!("[TEST] len: {}", test.len());

    let dataset = Dataset { train, val: Some(val), test: Some(test) };
    let mut config = TrainConfig::new(args.epochs, args.batch_size);
    config.max_batches = args.max_batches;

    let history = match &args.dump_dir {
        Some(dir) => {
            let mut sink = TxtDirSink::create(dir)?;
            train_network(&mut network, &dataset, &config, &mut sink)?
        }
        None => train_network(&mut network, &dataset, &config, &mut NullSink)?,
    };

    if let Some(last) = history.last() {
        if let (Some(loss), Some(acc)) = (last.val_loss, last.val_accuracy) {
            println!("val loss: {:.3}, val acc: {:.3}", loss, acc);
        }
    }
    if let Some(test) = &dataset.test {
        let (loss, acc) = evaluate(&mut network, test, args.batch_size)?;
        println!("test loss: {:.3}, test acc: {:.3}", loss, acc);
    }

    if let Some(path) = &args.save {
        network.save_json(path)?;
        println!("Model saved to {}", path);
    }
    Ok(())
}

fn compare(left: PathBuf, right: PathBuf, names: Vec<String>) -> probe_nn::Result<()> {
    let names = if names.is_empty() { None } else { Some(names.as_slice()) };
    for (cnt, diff) in compare_dirs(&left, &right, names)?.iter().enumerate() {
        println!("cnt = {}, {}: {}", cnt, diff.name, diff.max_abs_diff);
    }
    Ok(())
}
