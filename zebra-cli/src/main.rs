use std::time::Instant;

use zebra_core::{AllowedClueTypes, Category, CategoryId, CategoryKind, CategoryValue, ClueFamily};
use zebra_gen::session::ClueConstraints;
use zebra_gen::{GenerateOptions, GenerativeSession, Rng, generate_puzzle};
use zebra_solver::TargetFact;

#[cfg(feature = "tracing")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("zebra_solver=trace,zebra_gen=trace,zebra_cli=info")
    });

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(not(feature = "tracing"))]
fn init_tracing() {}

fn usage() -> &'static str {
    "zebra-cli\n\
\n\
USAGE:\n\
  zebra-cli generate --puzzle <tiny|cluedo|medals> [--seed <N>] [--allowed <fam,fam,...>]\n\
                      [--target] [--timeout-ms <N>] [--target-clue-count <N>]\n\
  zebra-cli step --puzzle <tiny|cluedo|medals> [--seed <N>] [--allowed <fam,fam,...>]\n\
                  [--steps <N>] [--remove <INDEX>]\n\
\n\
Clue families: binary, ordinal, superlative, unary, cross-ordinal, adjacency, between, or, arithmetic\n\
\n\
EXAMPLES:\n\
  zebra-cli generate --puzzle cluedo --seed 42 --allowed binary --target\n\
  zebra-cli step --puzzle medals --seed 7 --steps 4 --remove 1\n"
}

fn parse_arg_value(args: &[String], i: &mut usize) -> Result<String, String> {
    *i += 1;
    args.get(*i).cloned().ok_or_else(|| "missing value".to_string())
}

fn parse_family(s: &str) -> Option<ClueFamily> {
    match s {
        "binary" => Some(ClueFamily::Binary),
        "ordinal" => Some(ClueFamily::Ordinal),
        "superlative" => Some(ClueFamily::Superlative),
        "unary" => Some(ClueFamily::Unary),
        "cross-ordinal" => Some(ClueFamily::CrossOrdinal),
        "adjacency" => Some(ClueFamily::Adjacency),
        "between" => Some(ClueFamily::Between),
        "or" => Some(ClueFamily::Or),
        "arithmetic" => Some(ClueFamily::Arithmetic),
        _ => None,
    }
}

fn parse_allowed(s: &str) -> Result<AllowedClueTypes, String> {
    let mut allowed = AllowedClueTypes::new();
    for token in s.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        allowed.insert(parse_family(token).ok_or_else(|| format!("unknown clue family: {token}"))?);
    }
    Ok(allowed)
}

fn category(id: &str, kind: CategoryKind, values: &[(&str, Option<i64>)]) -> Category {
    Category {
        id: CategoryId::from(id),
        kind,
        values: values
            .iter()
            .map(|(label, rank)| match rank {
                Some(r) => CategoryValue::ordinal(*label, *r),
                None => CategoryValue::nominal(*label),
            })
            .collect(),
    }
}

fn tiny_puzzle() -> (Vec<Category>, Option<TargetFact>) {
    let categories = vec![
        category("Fruit", CategoryKind::Nominal, &[("Apple", None), ("Pear", None)]),
        category("Color", CategoryKind::Nominal, &[("Red", None), ("Green", None)]),
    ];
    (categories, None)
}

fn cluedo_puzzle() -> (Vec<Category>, Option<TargetFact>) {
    let categories = vec![
        category(
            "Suspect",
            CategoryKind::Nominal,
            &[("Mustard", None), ("Plum", None), ("Scarlet", None)],
        ),
        category(
            "Weapon",
            CategoryKind::Nominal,
            &[("Candlestick", None), ("Rope", None), ("Wrench", None)],
        ),
        category(
            "Room",
            CategoryKind::Nominal,
            &[("Kitchen", None), ("Library", None), ("Study", None)],
        ),
    ];
    let target = TargetFact::new("Suspect", "Mustard", "Weapon");
    (categories, Some(target))
}

fn medals_puzzle() -> (Vec<Category>, Option<TargetFact>) {
    let categories = vec![
        category(
            "Person",
            CategoryKind::Nominal,
            &[("Alva", None), ("Bern", None), ("Cato", None)],
        ),
        category(
            "Gold",
            CategoryKind::Ordinal,
            &[("10", Some(10)), ("20", Some(20)), ("30", Some(30))],
        ),
    ];
    (categories, None)
}

fn load_puzzle(name: &str) -> Result<(Vec<Category>, Option<TargetFact>), String> {
    match name {
        "tiny" => Ok(tiny_puzzle()),
        "cluedo" => Ok(cluedo_puzzle()),
        "medals" => Ok(medals_puzzle()),
        other => Err(format!("unknown --puzzle: {other}")),
    }
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err}\n\n{}", usage());
        std::process::exit(2);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        return Err("missing command".to_string());
    }

    let cmd = args[1].as_str();
    let mut puzzle: Option<String> = None;
    let mut seed: u32 = 1;
    let mut allowed = AllowedClueTypes::new();
    let mut with_target = false;
    let mut timeout_ms: u64 = zebra_gen::generator::DEFAULT_TIMEOUT_MS;
    let mut target_clue_count: Option<usize> = None;
    let mut steps: usize = 3;
    let mut remove: Option<usize> = None;

    let mut i = 2usize;
    while i < args.len() {
        match args[i].as_str() {
            "--puzzle" => puzzle = Some(parse_arg_value(&args, &mut i)?),
            "--seed" => {
                let v = parse_arg_value(&args, &mut i)?;
                seed = v.parse::<u32>().map_err(|_| "invalid --seed".to_string())?;
            }
            "--allowed" => {
                let v = parse_arg_value(&args, &mut i)?;
                allowed = parse_allowed(&v)?;
            }
            "--target" => with_target = true,
            "--timeout-ms" => {
                let v = parse_arg_value(&args, &mut i)?;
                timeout_ms = v.parse::<u64>().map_err(|_| "invalid --timeout-ms".to_string())?;
            }
            "--target-clue-count" => {
                let v = parse_arg_value(&args, &mut i)?;
                target_clue_count =
                    Some(v.parse::<usize>().map_err(|_| "invalid --target-clue-count".to_string())?);
            }
            "--steps" => {
                let v = parse_arg_value(&args, &mut i)?;
                steps = v.parse::<usize>().map_err(|_| "invalid --steps".to_string())?;
            }
            "--remove" => {
                let v = parse_arg_value(&args, &mut i)?;
                remove = Some(v.parse::<usize>().map_err(|_| "invalid --remove".to_string())?);
            }
            "--help" | "-h" => {
                println!("{}", usage());
                return Ok(());
            }
            other => return Err(format!("unknown arg: {other}")),
        }
        i += 1;
    }

    let Some(puzzle) = puzzle else {
        return Err("missing required flag: --puzzle".to_string());
    };
    let (categories, target) = load_puzzle(&puzzle)?;
    let target = if with_target { target } else { None };

    match cmd {
        "generate" => run_generate(categories, target, allowed, seed, timeout_ms, target_clue_count),
        "step" => run_step(categories, target, allowed, seed, steps, remove),
        _ => Err(format!("unknown command: {cmd}")),
    }
}

fn run_generate(
    categories: Vec<Category>,
    target: Option<TargetFact>,
    allowed: AllowedClueTypes,
    seed: u32,
    timeout_ms: u64,
    target_clue_count: Option<usize>,
) -> Result<(), String> {
    let options = GenerateOptions {
        target_clue_count,
        timeout_ms,
        allowed_clue_types: allowed,
        seed: Some(seed),
    };

    let start = Instant::now();
    let puzzle = generate_puzzle(categories, target, options).map_err(|e| e.to_string())?;
    let elapsed = start.elapsed().as_secs_f64();

    println!("incomplete={} clues={} elapsed_s={:.3}", puzzle.incomplete, puzzle.clues.len(), elapsed);
    for (i, step) in puzzle.proof_chain.iter().enumerate() {
        println!(
            "{i:>3}: {:?} (updates={}, percent_complete={:.1}%)",
            step.clue, step.updates, step.percent_complete
        );
    }
    Ok(())
}

fn run_step(
    categories: Vec<Category>,
    target: Option<TargetFact>,
    allowed: AllowedClueTypes,
    seed: u32,
    steps: usize,
    remove: Option<usize>,
) -> Result<(), String> {
    let mut session = GenerativeSession::start(categories, allowed, target, Rng::from_seed(seed))
        .map_err(|e| e.to_string())?;

    for _ in 0..steps {
        let next = session
            .get_next_clue(None::<&ClueConstraints>)
            .map_err(|e| e.to_string())?;
        match next.clue {
            Some(clue) => println!("+ {clue:?}"),
            None => {
                println!("(solved)");
                break;
            }
        }
    }

    if let Some(index) = remove {
        session.remove_clue_at(index).map_err(|e| e.to_string())?;
        println!("-- removed clue {index}, chain now has {} clue(s)", session.get_proof_chain().len());
    }

    println!("chain:");
    for (i, step) in session.get_proof_chain().iter().enumerate() {
        println!("  {i:>3}: {:?}", step.clue);
    }
    Ok(())
}
