use crate::serializable_record;
use mcube_algorithms::Outcome;
use mcube_challenges::{Difficulty, ObjectiveKind, Solution};
use mcube_utils::{jsonify, u8s_from_str};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

serializable_record! {
    #[serde(deny_unknown_fields)]
    RunSettings {
        algorithm_id: String,
        size: usize,
        #[serde(default)]
        objective: ObjectiveKind,
    }
}
impl RunSettings {
    /// Seed for one run: blake3 over the canonical settings JSON, `rand_hash` and `nonce`.
    pub fn calc_seed(&self, rand_hash: &String, nonce: u64) -> [u8; 32] {
        u8s_from_str(&format!("{}{}{}", jsonify(self), rand_hash, nonce))
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty {
            size: self.size,
            objective: self.objective,
        }
    }
}

serializable_record! {
    OutputData {
        nonce: u64,
        settings: RunSettings,
        hyperparameters: Option<Map<String, Value>>,
        outcome: Outcome,
        solution: Solution,
    }
}
impl OutputData {
    /// The run reached a zero-error lattice.
    pub fn is_solved(&self) -> bool {
        self.outcome.best_error == 0
    }
}
