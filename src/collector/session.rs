/// Counters threaded through one collection run
#[derive(Debug)]
pub struct Session {
    max_blocks: usize,
    max_blocks_per_repo: usize,
    collected: usize,
    repo_collected: usize,
    next_sequence: u64,
}

impl Session {
    pub fn new(max_blocks: usize, max_blocks_per_repo: usize) -> Self {
        Self {
            max_blocks,
            max_blocks_per_repo,
            collected: 0,
            repo_collected: 0,
            next_sequence: 1,
        }
    }

    pub fn collected(&self) -> usize {
        self.collected
    }

    pub fn repo_collected(&self) -> usize {
        self.repo_collected
    }

    /// Sequence number the next written record will get
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn start_repo(&mut self) {
        self.repo_collected = 0;
    }

    pub fn global_cap_reached(&self) -> bool {
        self.collected >= self.max_blocks
    }

    /// Checked before every file and every block
    pub fn has_capacity(&self) -> bool {
        !self.global_cap_reached() && self.repo_collected < self.max_blocks_per_repo
    }

    /// Count a record that reached storage
    pub fn record_written(&mut self) {
        self.collected += 1;
        self.repo_collected += 1;
        self.next_sequence += 1;
    }
}
