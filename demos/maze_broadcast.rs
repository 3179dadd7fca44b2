//! Maze game broadcaster
//!
//! Run with: cargo run --example maze_broadcast [VIDEO_URL] [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example maze_broadcast                                   # no camera, 1 snapshot/s
//!   cargo run --example maze_broadcast rtsp://10.1.0.1:7447/cam          # snapshot on each new second of video
//!   cargo run --example maze_broadcast rtsp://10.1.0.1:7447/cam 0.0.0.0:1400
//!
//! Watch with:
//!   nc -v localhost 1337
//!   cargo run --example viewer localhost:1337

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use mazecast::capture::{FrameSource, FrameSourceConfig};
use mazecast::{BroadcastHub, HubConfig, Snapshot};

const MAZE: [&str; 13] = [
    "#############S#######",
    "#   #   #         # #",
    "# ### # # ######### #",
    "#     #             #",
    "# # # ########### ###",
    "# # #         # #   #",
    "### # ######### ### #",
    "#   #   # #       # #",
    "# ####### # # # #####",
    "#           # #     #",
    "# ##### ### ### # ###",
    "#   #     # #   #   #",
    "#############E#######",
];

/// Game state owned by the driver loop
struct MazeGame {
    fruits: Vec<(usize, usize)>,
    /// Each ghost patrols between two cells
    ghosts: Vec<[(usize, usize); 2]>,
    tick: u64,
}

impl MazeGame {
    fn new() -> Self {
        Self {
            fruits: vec![
                (2, 1),
                (2, 3),
                (9, 11),
                (13, 5),
                (13, 9),
                (17, 5),
                (19, 5),
                (19, 11),
            ],
            ghosts: vec![
                [(6, 3), (19, 1)],
                [(3, 11), (5, 11)],
                [(17, 7), (19, 9)],
                [(15, 1), (17, 1)],
            ],
            tick: 0,
        }
    }

    fn advance(&mut self) {
        self.tick += 1;
    }

    fn snapshot(&self) -> Result<Snapshot, mazecast::protocol::SnapshotError> {
        let mut grid: Vec<Vec<char>> = MAZE.iter().map(|row| row.chars().collect()).collect();

        for &(x, y) in &self.fruits {
            grid[y][x] = 'F';
        }
        for ghost in &self.ghosts {
            let (x, y) = ghost[(self.tick % 2) as usize];
            grid[y][x] = 'G';
        }

        Snapshot::new(grid.into_iter().map(|row| row.into_iter().collect::<String>()))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mazecast=info".parse()?)
                .add_directive("maze_broadcast=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let url = args.get(1).cloned();
    let bind_addr: SocketAddr = match args.get(2) {
        Some(addr) => addr.parse()?,
        None => HubConfig::default().bind_addr,
    };

    let hub = BroadcastHub::start(HubConfig::default().bind(bind_addr))?;
    println!("Broadcasting on {}", hub.local_addr());

    let mut game = MazeGame::new();

    let Some(url) = url else {
        loop {
            hub.send(game.snapshot()?);
            game.advance();
            std::thread::sleep(Duration::from_secs(1));
        }
    };

    let mut source = FrameSource::new(FrameSourceConfig::new(url));
    source.start()?;

    let started = Instant::now();
    let mut last_second = 0;
    loop {
        let frame = source.pop_frame();

        let second = started.elapsed().as_secs();
        if second != last_second {
            last_second = second;
            let stats = source.stats();
            tracing::info!(
                shape = ?frame.shape(),
                age_ms = frame.age().as_millis() as u64,
                fps = %format!("{:.2}", stats.capture_fps()),
                skipped = stats.frames_skipped,
                viewers = hub.client_count(),
                "Send maze"
            );
            hub.send(game.snapshot()?);
            game.advance();
        }
    }
}
