use std::{path::PathBuf, sync::Arc, thread};

use filelog::{FileLogSet, LogDestination, logger_config};

fn main() {
    let dir = PathBuf::from("/tmp/filelog_example_rotation");
    let _ = std::fs::remove_dir_all(&dir);

    let guard = logger_config()
        .with_name("rotation-demo")
        .with_header("# audit log, one record per line")
        .with_destination(
            LogDestination::new(&dir, "audit", ".log")
                .with_max_files(3)
                .with_max_file_size(2048),
        )
        .init_global()
        .expect("Unable to configure audit log");

    let writer = Arc::clone(guard.writer());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            thread::spawn(move || {
                for i in 0..25 {
                    log::info!("thread={t} seq={i} action=read resource=/orders/{i}");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    println!("bytes in active file: {}", writer.current_count());

    drop(guard);

    let set = FileLogSet::new(&dir, "audit", ".log", 3);
    let rolled = set.rolled_files();

    println!("\n--- Rotation Summary ---");
    println!("Log directory: {}", dir.display());
    println!("Active file: {}", set.active_path().display());
    println!("Rolled files remaining (max_files=3): {}", rolled.len());
    for f in &rolled {
        println!("  {f}");
    }
    assert!(rolled.len() <= 3, "max_files pruning should keep at most 3");
}
