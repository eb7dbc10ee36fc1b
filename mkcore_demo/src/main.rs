mod logging;

use clap::{value_t, App, Arg, ArgMatches};
use kernel::{BlockFile, KernelConfig, KernelResult, Microkernel};
use log::{error, info};
use std::fmt::Debug;
use std::fs::OpenOptions;
use std::sync::Arc;

const DEVICE: &str = "/dev/sda1";
const MOUNT_POINT: &str = "/mnt";
const IMAGE_BLOCKS: u64 = 2048;

fn main() {
    demo().expect("Error when running the microkernel demo!");
}

fn report<T: Debug>(step: &str, result: KernelResult<T>) -> Option<T> {
    match result {
        Ok(value) => {
            println!("{:<32} ok: {:?}", step, value);
            Some(value)
        }
        Err(err) => {
            println!("{:<32} failed: {}", step, err);
            None
        }
    }
}

fn show(message: Option<Vec<u8>>) -> String {
    match message {
        Some(bytes) => format!("{:?}", String::from_utf8_lossy(&bytes)),
        None => "nothing".into(),
    }
}

fn config_from(matches: &ArgMatches) -> KernelConfig {
    let mut config = KernelConfig::default();
    if matches.is_present("ceiling") {
        config = config.with_max_process_memory(
            value_t!(matches, "ceiling", usize).unwrap_or_else(|e| e.exit()),
        );
    }
    if matches.is_present("fs-capacity") {
        config = config
            .with_fs_capacity(value_t!(matches, "fs-capacity", usize).unwrap_or_else(|e| e.exit()));
    }
    if matches.is_present("cache-cap") {
        let cap = value_t!(matches, "cache-cap", usize).unwrap_or_else(|e| e.exit());
        config = config.with_cache_capacity(if cap == 0 { None } else { Some(cap) });
    }
    config
}

fn demo() -> std::io::Result<()> {
    let matches = App::new("mkcore demo")
        .about("Runs the microkernel demonstration script")
        .arg(
            Arg::with_name("ceiling")
                .long("ceiling")
                .takes_value(true)
                .help("Per-process memory ceiling in bytes"),
        )
        .arg(
            Arg::with_name("fs-capacity")
                .long("fs-capacity")
                .takes_value(true)
                .help("Byte budget of each mounted filesystem"),
        )
        .arg(
            Arg::with_name("cache-cap")
                .long("cache-cap")
                .takes_value(true)
                .help("Clean blocks kept in the cache, 0 for no limit"),
        )
        .arg(
            Arg::with_name("block-size")
                .long("block-size")
                .takes_value(true)
                .help("Block size of the demo device"),
        )
        .arg(
            Arg::with_name("image")
                .short("i")
                .long("image")
                .takes_value(true)
                .help("Back the demo device with this file instead of memory"),
        )
        .arg(
            Arg::with_name("log")
                .long("log")
                .takes_value(true)
                .possible_values(&["off", "error", "warn", "info", "debug", "trace"])
                .help("Log level, defaults to $LOG or info"),
        )
        .get_matches();

    if let Err(err) = logging::init(matches.value_of("log")) {
        eprintln!("logger already installed: {}", err);
    }

    let config = config_from(&matches);
    let block_size = if matches.is_present("block-size") {
        value_t!(matches, "block-size", usize).unwrap_or_else(|e| e.exit())
    } else {
        kernel::config::DEFAULT_BLOCK_SIZE
    };
    info!("starting microkernel with {:?}", config);
    let mk = Microkernel::new(config);

    match matches.value_of("image") {
        Some(path) => {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)?;
            file.set_len(IMAGE_BLOCKS * block_size as u64)?;
            info!("{} backed by {}", DEVICE, path);
            report(
                "attach device",
                mk.attach_device(DEVICE, block_size, Arc::new(BlockFile::new(file, block_size))),
            );
        }
        None => {
            report("register device", mk.register_device(DEVICE, block_size));
        }
    }

    // processes and memory
    report("add process 2", mk.add_process(2));
    report("allocate 1024 for process 1", mk.allocate(1024, 1));
    if let Some(block) = report("allocate 64 for process 2", mk.allocate(64, 2)) {
        report("free as process 1", mk.free(block.id, 1));
        report("free as process 2", mk.free(block.id, 2));
    }
    println!("memory table: {:?}", mk.memory_snapshot());

    // mailboxes
    report("send to process 2", mk.send(2, "Hello from process 2"));
    println!("receive from process 2: {}", show(mk.receive(2)));
    println!("receive from process 3: {}", show(mk.receive(3)));
    println!("receive from process 2 again: {}", show(mk.receive(2)));

    // named queues and semaphores
    report("create queue jobs", mk.create_queue("jobs"));
    report("send to jobs", mk.send_queue("jobs", "job #1"));
    println!("receive from jobs: {}", show(mk.receive_queue("jobs")));
    report("create semaphore disk", mk.sem_create("disk", 1));
    report("acquire disk", mk.sem_acquire("disk"));
    report("acquire disk again", mk.sem_acquire("disk"));
    report("release disk", mk.sem_release("disk"));

    // filesystem
    report("mount", mk.mount(DEVICE, MOUNT_POINT));
    report("create /mnt/test.txt", mk.create_file("/mnt/test.txt", 10));
    report("write /mnt/test.txt", mk.write_file("/mnt/test.txt", b"Hello, world!"));
    if let Some(data) = report("read /mnt/test.txt", mk.read_file("/mnt/test.txt")) {
        println!("read from mounted file: {}", String::from_utf8_lossy(&data));
    }
    report("free space under /mnt", mk.free_space(MOUNT_POINT));
    report("delete /mnt/test.txt", mk.delete_file("/mnt/test.txt"));
    report("unmount", mk.unmount(MOUNT_POINT));
    report("read after unmount", mk.read_file("/mnt/test.txt"));

    // block cache and buffer
    mk.write_block(DEVICE, 1, b"This is a block of data");
    if let Some(data) = report("read block 1", mk.read_block(DEVICE, 1)) {
        println!("block 1: {}", String::from_utf8_lossy(&data));
    }
    mk.write_block(DEVICE, 2, b"dirty block");
    report("flush buffer", mk.flush_buffer());
    report("evict cache", mk.evict_cache());
    report("evict empty cache", mk.evict_cache());
    println!("cache stats: {:?}", mk.cache_stats());

    if let Err(err) = mk.remove_process(2) {
        error!("removing process 2: {}", err);
    }
    Ok(())
}
