// [libs/domain/obsidian/src/config.rs]
//! Signing material and sealing/retention knobs for the ledger pillar.

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub instance_id: String,
    pub signing_key: Vec<u8>,
    pub merkle_block_size: usize,
    pub retention_days: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            instance_id: "obsidian-default".to_string(),
            signing_key: b"change-me-in-production".to_vec(),
            merkle_block_size: 100,
            retention_days: 2555,
        }
    }
}
