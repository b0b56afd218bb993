// Performance measurement for RbTree instances. Measure:
// * Initial load of N entries with random keys, default 1M.
// * Search for every loaded entry with a detached probe.
// * Remove the first half of the loaded entries.
//
// Validate the tree after load and after removal, and log leaf depth
// statistics for both.

use std::{cmp::Ordering, env, time::Instant};

use intrusive_rb::{Comparator, Error, Link, Linked, RbTree};
use log::{error, info};
use rand::prelude::random;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

struct Entry<'a> {
    key: u64,
    link: Link<'a, Entry<'a>>,
}

impl<'a> Entry<'a> {
    fn new(key: u64) -> Entry<'a> {
        Entry {
            key,
            link: Link::new(),
        }
    }
}

impl<'a> Linked<'a> for Entry<'a> {
    fn link(&self) -> &Link<'a, Self> {
        &self.link
    }
}

fn by_key(a: &Entry, b: &Entry) -> Ordering {
    a.key.cmp(&b.key)
}

fn main() {
    let level = LevelFilter::Info;
    let mode = TerminalMode::Mixed;
    TermLogger::init(level, Config::default(), mode, ColorChoice::Auto).ok();

    let n: usize = env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1_000_000);

    let entries: Vec<Entry> = (0..n).map(|_| Entry::new(random())).collect();
    let mut tree = RbTree::new("rb-perf", by_key);

    let start = Instant::now();
    let mut dups = 0;
    for entry in entries.iter() {
        match tree.insert(entry) {
            Ok(_) => (),
            Err(Error::DuplicateKey) => dups += 1,
            Err(err) => error!("insert: {}", err),
        }
    }
    info!(
        "loaded {} entries ({} duplicates) in {:?}",
        tree.len(),
        dups,
        start.elapsed()
    );
    report(&tree, "load ");

    let start = Instant::now();
    let found = entries
        .iter()
        .filter(|entry| tree.search(&Entry::new(entry.key)).is_some())
        .count();
    info!("searched {} entries in {:?}", found, start.elapsed());

    let start = Instant::now();
    let removed = entries[..n / 2]
        .iter()
        .filter(|entry| tree.remove(*entry).is_ok())
        .count();
    info!("removed {} entries in {:?}", removed, start.elapsed());
    report(&tree, "remove ");

    tree.clear();
}

fn report<'a, C>(tree: &RbTree<'a, Entry<'a>, C>, prefix: &str)
where
    C: Comparator<Entry<'a>>,
{
    match tree.validate() {
        Ok(stats) => {
            info!("{}blacks: {:?}", prefix, stats.blacks());
            if let Some(depths) = stats.depths() {
                depths.log(prefix);
            }
        }
        Err(err) => error!("{}validate: {}", prefix, err),
    }
}
