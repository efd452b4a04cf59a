use crate::commitment::{sk_to_pk, AssetId};
use crate::generators::Generators;
use crate::kdf::{HKdf, Kdf, KeyIdv, KeyType, PublicKdf};
use crate::oracle::Oracle;
use crate::point::{mul_point, MulMode, PointRepr};
use crate::signature::Signature;
use crate::transaction::{Context, Output, Params, Transaction, TxKernel};
use curve25519_dalek::Scalar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use zeroize::Zeroizing;

/// Identifier a wallet presents to the emission plan.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct PeerId(pub [u8; 32]);

/// Plan shape: how many bursts and the height step between maturities.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Parameters {
    pub bursts: u32,
    pub maturity_step: u64,
}

/// One requested burst: amount and the height at which it matures.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RequestGroup {
    pub value: u64,
    pub maturity: u64,
}

/// What the plan asks one wallet to claim.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Request {
    pub wallet_id: PeerId,
    pub groups: Vec<RequestGroup>,
}

/// One approved burst: a confidential output maturing at the requested
/// height and a kernel whose excess cancels the output blinding.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ResponseGroup {
    pub output: Output,
    pub kernel: TxKernel,
}

/// A wallet's answer to its [`Request`], signed with the wallet key. Valid
/// only against the request it answers.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Response {
    pub wallet_id: PeerId,
    pub groups: Vec<ResponseGroup>,
    pub signature: Signature,
}

/// Plan bookkeeping for one wallet.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Entry {
    pub request: Request,
    pub response: Option<Response>,
}

/// The emission plan: one entry per participating wallet.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Treasury {
    pub entries: Vec<Entry>,
}

/// Wallet identity bound to a derivation context.
pub fn get_id(gens: &Generators, kdf: &HKdf) -> (PeerId, Zeroizing<Scalar>) {
    let kidv = KeyIdv::new(0, 0, KeyType::TREASURY, 0);
    let sk = kdf.derive_secret(&kidv.to_hash());
    (PeerId(sk_to_pk(gens, &sk)), sk)
}

impl Treasury {
    /// Plan `total` for `wallet_id`, split across the parameterized bursts
    /// with rising maturities.
    pub fn create_plan(
        &mut self,
        wallet_id: PeerId,
        total: u64,
        params: &Parameters,
    ) -> &mut Entry {
        let bursts = u64::from(params.bursts.max(1));
        let per_burst = total / bursts;
        let mut groups = Vec::with_capacity(bursts as usize);
        for i in 0..bursts {
            let value = if i + 1 == bursts { total - per_burst * (bursts - 1) } else { per_burst };
            groups.push(RequestGroup { value, maturity: (i + 1) * params.maturity_step });
        }
        let index = self.entries.len();
        self.entries.push(Entry { request: Request { wallet_id, groups }, response: None });
        &mut self.entries[index]
    }

    /// Aggregate every collected response into per-maturity groups.
    pub fn build(&self, data: &mut Data) {
        let mut by_maturity: BTreeMap<u64, (u64, Transaction)> = BTreeMap::new();
        for entry in &self.entries {
            let Some(response) = &entry.response else { continue };
            for (req, rsp) in entry.request.groups.iter().zip(response.groups.iter()) {
                let (value, tx) = by_maturity.entry(req.maturity).or_default();
                *value += req.value;
                tx.outputs.push(rsp.output.clone());
                tx.kernels.push(rsp.kernel.clone());
            }
        }
        data.groups = by_maturity
            .into_iter()
            .map(|(maturity, (value, mut tx))| {
                tx.normalize();
                DataGroup { maturity, value, data: tx }
            })
            .collect();
    }
}

impl Response {
    /// Approve `request`: one confidential output and a cancelling kernel
    /// per burst, then sign the whole response with the wallet key.
    /// `index` supplies consecutive derivation indices for the new coins.
    pub fn create(gens: &Generators, request: &Request, kdf: &HKdf, index: &mut u64) -> Self {
        let (wallet_id, wallet_sk) = get_id(gens, kdf);

        let mut groups = Vec::with_capacity(request.groups.len());
        for group in &request.groups {
            let kidv = KeyIdv::new(*index, 0, KeyType::TREASURY, group.value);
            *index += 1;

            let (sk, output) =
                Output::create(gens, kdf, kdf, &kidv, AssetId::NATIVE, false, group.maturity);
            let mut kernel = TxKernel::default();
            kernel.sign(gens, &-&*sk);
            groups.push(ResponseGroup { output, kernel });
        }

        let msg = challenge_msg(&wallet_id, &groups);
        let signature = Signature::sign(gens, &msg, &wallet_sk);
        Response { wallet_id, groups, signature }
    }

    /// Check this response against the request it claims to answer: the
    /// wallet signature, every proof and kernel, the maturities, and the
    /// per-burst balance `excess == value·H`.
    pub fn is_valid(&self, gens: &Generators, request: &Request) -> bool {
        if self.wallet_id != request.wallet_id || self.groups.len() != request.groups.len() {
            return false;
        }
        let wallet_pk = match PointRepr::from_bytes(self.wallet_id.0).import() {
            Ok(pk) => pk,
            Err(_) => return false,
        };
        let msg = challenge_msg(&self.wallet_id, &self.groups);
        if !self.signature.is_valid(gens, &msg, &wallet_pk) {
            return false;
        }

        for (req, rsp) in request.groups.iter().zip(self.groups.iter()) {
            if rsp.output.incubation != req.maturity {
                return false;
            }
            let tx = Transaction {
                outputs: vec![rsp.output.clone()],
                kernels: vec![rsp.kernel.clone()],
                ..Transaction::default()
            };
            let mut ctx = Context::new(Params::default());
            if ctx.validate_and_summarize(gens, &tx).is_err()
                || ctx.total_fee() != 0
                || ctx.excess() != mul_point(gens.h(), &Scalar::from(req.value), MulMode::Fast)
            {
                return false;
            }
        }
        true
    }
}

fn challenge_msg(wallet_id: &PeerId, groups: &[ResponseGroup]) -> [u8; 32] {
    let mut oracle = Oracle::new();
    oracle.feed(b"treasury.rsp");
    oracle.feed(&wallet_id.0);
    oracle.feed_u64(groups.len() as u64);
    for group in groups {
        oracle.feed(group.output.commitment.as_bytes());
        oracle.feed_u64(group.output.incubation);
        oracle.feed(&group.kernel.id(None));
    }
    oracle.draw()
}

/// One finalized burst: the subsidy amount plus the combined outputs and
/// kernels that mature together.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DataGroup {
    pub maturity: u64,
    pub value: u64,
    pub data: Transaction,
}

impl DataGroup {
    /// Re-validate the group against its subsidy: all proofs and kernels
    /// must hold and the excess must equal exactly `value·H`.
    pub fn is_valid(&self, gens: &Generators) -> bool {
        let mut ctx = Context::new(Params::default());
        ctx.validate_and_summarize(gens, &self.data).is_ok()
            && ctx.total_fee() == 0
            && ctx.excess() == mul_point(gens.h(), &Scalar::from(self.value), MulMode::Fast)
    }
}

/// A burst of the finalized schedule.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Burst {
    pub maturity: u64,
    pub value: u64,
}

/// A coin recovered from the finalized treasury by its owner.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Coin {
    pub kidv: KeyIdv,
    pub maturity: u64,
}

/// The finalized treasury, ready to be embedded into the chain.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Data {
    pub groups: Vec<DataGroup>,
    pub custom_msg: String,
}

impl Data {
    pub fn is_valid(&self, gens: &Generators) -> bool {
        !self.groups.is_empty() && self.groups.iter().all(|g| g.is_valid(gens))
    }

    pub fn get_bursts(&self) -> Vec<Burst> {
        self.groups.iter().map(|g| Burst { maturity: g.maturity, value: g.value }).collect()
    }

    /// Scan every output for coins recoverable with `kdf`.
    pub fn recover(&self, kdf: &impl PublicKdf) -> Vec<Coin> {
        let mut coins = Vec::new();
        for group in &self.groups {
            for output in &group.data.outputs {
                if let Some(kidv) = output.recover(kdf) {
                    coins.push(Coin { kidv, maturity: output.incubation });
                }
            }
        }
        coins
    }
}
