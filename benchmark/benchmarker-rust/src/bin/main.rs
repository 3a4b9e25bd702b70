use benchmarker::dataset::{parse_manifest, read, Manifest, ManifestItem};
use benchmarker::measure_memory::MeasureMemory;
use benchmarker::measure_time::measure_time;
use benchmarker::subject::Subject;
use std::error::Error;
use swisstable::{FastHasher, Hashtable};

#[global_allocator]
static MEASURE_MEMORY: MeasureMemory = MeasureMemory::new();

fn solver<S: Subject>(manifest: &Manifest) -> Result<(), Box<dyn Error>> {
    for ManifestItem { name, files } in manifest.iter() {
        let mut time_build = 0usize;
        let mut time_probe = 0usize;
        let mut time_foreach = 0usize;
        let mut subject = S::new();
        read(files, |strings| {
            time_build += measure_time(|| {
                for string in strings {
                    subject.build(string, || 1, |x| *x += 1);
                }
            });
        })?;
        let mut missing = 0usize;
        read(files, |strings| {
            time_probe += measure_time(|| {
                for string in strings.iter() {
                    if subject.probe(string).is_none() {
                        missing += 1;
                    }
                }
            });
        })?;
        if missing != 0 {
            return Err(format!("{}: {missing} keys lost in {name}", S::NAME).into());
        }
        let mut count = 0u64;
        let mut count_distinct = 0u64;
        time_foreach += measure_time(|| {
            subject.foreach(|(_, v)| {
                count += 1;
                count_distinct += v;
            })
        });
        let before_dropping = MEASURE_MEMORY.measure();
        drop(subject);
        let memory = before_dropping.saturating_sub(MEASURE_MEMORY.measure());
        println!(
            "{},{name},{time_build},{time_probe},{time_foreach},{memory},{count},{count_distinct}",
            S::NAME
        );
    }
    Ok(())
}

#[derive(clap::Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// Directory holding `manifest.json` and the dataset files.
    #[clap(short, long, value_parser)]
    path: Option<String>,
    /// Only run the named subject.
    #[clap(short, long, value_parser)]
    subject: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = <Args as clap::Parser>::parse();
    if let Some(path) = args.path {
        std::env::set_current_dir(path)?;
    }
    let manifest = parse_manifest(&std::fs::read_to_string("manifest.json")?)?;
    let wanted = |name: &str| args.subject.as_deref().map_or(true, |s| s == name);
    println!("subject,dataset,time_build,time_probe,time_foreach,memory,count,count_distinct");
    type Swiss = Hashtable<Box<[u8]>, u64, FastHasher>;
    type SwissAhash = Hashtable<Box<[u8]>, u64>;
    type Hashbrown = hashbrown::HashMap<Box<[u8]>, u64>;
    if wanted(Swiss::NAME) {
        solver::<Swiss>(&manifest)?;
    }
    if wanted(SwissAhash::NAME) {
        solver::<SwissAhash>(&manifest)?;
    }
    if wanted(Hashbrown::NAME) {
        solver::<Hashbrown>(&manifest)?;
    }
    Ok(())
}
