use crate::commitment::{AssetId, SwitchCommitment};
use crate::error::DecodeError;
use crate::generators::Generators;
use crate::inner_product::BatchContext;
use crate::kdf::{Kdf, KeyIdv, PublicKdf};
use crate::oracle::Oracle;
use crate::point::{is_zero, mul_point, MulMode, PointRepr};
use crate::range_proof::{Confidential, CreatorParams, Public};
use crate::scalar::ScalarRepr;
use crate::signature::Signature;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::traits::Identity;
use curve25519_dalek::Scalar;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;
use zeroize::Zeroizing;

/// Maximum supported depth of nested kernels. Kernels form a finite owned
/// tree; anything deeper cannot be validated in bounded time and is rejected.
pub const MAX_KERNEL_DEPTH: u32 = 3;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TxError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("transaction elements are not sorted")]
    Misordered,
    #[error("duplicate input commitment")]
    DuplicateInput,
    #[error("duplicate output commitment")]
    DuplicateOutput,
    #[error("input matches an output that was not cut through")]
    UnresolvedCutThrough,
    #[error("output carries an invalid range proof")]
    InvalidRangeProof,
    #[error("kernel signature does not verify")]
    InvalidKernelSignature,
    #[error("kernels nest deeper than the supported limit")]
    KernelNesting,
    #[error("aggregate commitments do not balance")]
    Imbalance,
}

/// Spend of an existing output, identified by its commitment.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Input {
    pub commitment: PointRepr,
}

/// Newly created output: a switch commitment plus exactly one range proof.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Output {
    pub commitment: PointRepr,
    pub coinbase: bool,
    pub asset_id: AssetId,
    pub incubation: u64,
    pub public_proof: Option<Public>,
    pub confidential_proof: Option<Confidential>,
}

impl Output {
    /// Build an output for `kidv`. The blinding key comes from `coin_kdf` via
    /// the switch commitment; the proof seed is derived from `tag_kdf` and
    /// the commitment, so the owner can later [`recover`](Self::recover) the
    /// kidv without storing anything. Returns the blinding key alongside the
    /// output.
    pub fn create(
        gens: &Generators,
        coin_kdf: &impl Kdf,
        tag_kdf: &impl PublicKdf,
        kidv: &KeyIdv,
        asset_id: AssetId,
        public: bool,
        incubation: u64,
    ) -> (Zeroizing<Scalar>, Output) {
        let switch = SwitchCommitment::new(gens, &asset_id);
        let (sk, comm) = switch.create(gens, coin_kdf, kidv);
        let commitment = PointRepr::export(&comm);
        let params = CreatorParams { kidv: *kidv, seed: proof_seed(tag_kdf, &commitment) };

        let mut out = Output {
            commitment,
            coinbase: false,
            asset_id,
            incubation,
            public_proof: None,
            confidential_proof: None,
        };
        let mut oracle = out.proof_oracle();
        if public {
            out.public_proof = Some(Public::create(gens, &sk, &params, &mut oracle));
        } else {
            out.confidential_proof =
                Some(Confidential::create(gens, &sk, &params, &mut oracle, switch.h_gen()));
        }
        (sk, out)
    }

    // the incubation height is bound into the proof transcript
    fn proof_oracle(&self) -> Oracle {
        let mut oracle = Oracle::new();
        oracle.feed_u64(self.incubation);
        oracle
    }

    pub fn is_valid(&self, gens: &Generators) -> bool {
        let mut batch = BatchContext::new(false);
        self.is_valid_with(gens, &mut batch)
    }

    /// Exactly one proof must be present and verify against the commitment
    /// and the asset generator; confidential proofs defer to `batch`.
    pub fn is_valid_with(&self, gens: &Generators, batch: &mut BatchContext) -> bool {
        let comm = match self.commitment.import() {
            Ok(c) => c,
            Err(_) => return false,
        };
        let switch = SwitchCommitment::new(gens, &self.asset_id);
        let mut oracle = self.proof_oracle();
        match (&self.public_proof, &self.confidential_proof) {
            (Some(proof), None) => proof.is_valid(gens, &mut oracle, &comm, switch.h_gen()),
            (None, Some(proof)) => {
                proof.is_valid_with(gens, batch, &mut oracle, &comm, switch.h_gen())
            }
            _ => false,
        }
    }

    /// Re-identify an own output: reconstruct the kidv from the proof's
    /// recovery material. `None` for foreign outputs.
    pub fn recover(&self, tag_kdf: &impl PublicKdf) -> Option<KeyIdv> {
        let seed = proof_seed(tag_kdf, &self.commitment);
        if let Some(proof) = &self.public_proof {
            return proof.recover(&seed);
        }
        if let Some(proof) = &self.confidential_proof {
            let mut oracle = self.proof_oracle();
            return proof.recover(&mut oracle, &seed);
        }
        None
    }
}

fn proof_seed(tag_kdf: &impl PublicKdf, commitment: &PointRepr) -> [u8; 32] {
    let hv = Oracle::new().feed(b"out.seed").feed(commitment.as_bytes()).draw();
    let tag = tag_kdf.derive_public_scalar(&hv);
    Oracle::new().feed(b"out.seed.fin").feed_scalar(&tag).draw()
}

/// Hash-lock attachment: the kernel is satisfied only when the stored
/// preimage hashes to the image the kernel was signed over.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct HashLock {
    pub preimage: [u8; 32],
}

impl HashLock {
    pub fn image(preimage: &[u8; 32]) -> [u8; 32] {
        Oracle::new().feed(b"hl").feed(preimage).draw()
    }
}

/// A signed authorization folded into a transaction: fee, excess commitment,
/// optional hash-lock, optional nested kernels and optional asset emission.
///
/// For emission kernels the commitment doubles as the asset id and the
/// signature is produced by the asset's own key.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct TxKernel {
    pub fee: u64,
    pub commitment: PointRepr,
    pub signature: Signature,
    pub asset_emission: i64,
    pub hash_lock: Option<HashLock>,
    pub nested: Vec<TxKernel>,
}

impl TxKernel {
    /// Kernel id: a hash over every field, nested kernel ids included.
    ///
    /// `lock_image` lets co-signers commit to a hash-lock image before the
    /// preimage is known; otherwise the stored preimage is hashed.
    pub fn id(&self, lock_image: Option<&[u8; 32]>) -> [u8; 32] {
        let mut oracle = Oracle::new();
        oracle.feed(b"krn");
        oracle.feed_u64(self.fee);
        oracle.feed(self.commitment.as_bytes());
        oracle.feed(&self.asset_emission.to_be_bytes());
        match (&self.hash_lock, lock_image) {
            (Some(_), Some(image)) => {
                oracle.feed(&[1]);
                oracle.feed(image);
            }
            (Some(lock), None) => {
                oracle.feed(&[1]);
                oracle.feed(&HashLock::image(&lock.preimage));
            }
            (None, _) => {
                oracle.feed(&[0]);
            }
        }
        oracle.feed_u64(self.nested.len() as u64);
        for nested in &self.nested {
            oracle.feed(&nested.id(None));
        }
        oracle.draw()
    }

    /// Single-party signing: the commitment becomes `G·sk` and the signature
    /// covers the kernel id. Emission kernels are signed this way by the
    /// asset key.
    pub fn sign(&mut self, gens: &Generators, sk: &Scalar) {
        self.commitment = PointRepr::export(&(gens.g() * sk));
        let id = self.id(None);
        self.signature = Signature::sign(gens, &id, sk);
    }

    /// Standalone check: verifies this kernel tree and reports its total fee
    /// and excess.
    pub fn is_valid(&self, gens: &Generators) -> Result<(u128, RistrettoPoint), TxError> {
        let mut fee = 0u128;
        let mut excess = RistrettoPoint::identity();
        self.validate(gens, &Params::default(), 0, &mut fee, &mut excess)?;
        Ok((fee, excess))
    }

    fn validate(
        &self,
        gens: &Generators,
        params: &Params,
        depth: u32,
        fee: &mut u128,
        sigma: &mut RistrettoPoint,
    ) -> Result<(), TxError> {
        if depth > MAX_KERNEL_DEPTH {
            return Err(TxError::KernelNesting);
        }
        let comm = self.commitment.import()?;

        // nested excesses are folded into the parent's commitment; the
        // signature covers only the parent's own share
        let mut own = comm;
        for nested in &self.nested {
            nested.validate(gens, params, depth + 1, fee, sigma)?;
            own -= nested.commitment.import()?;
        }

        let id = self.id(None);
        if !self.signature.is_valid(gens, &id, &own) {
            debug!("kernel signature rejected");
            return Err(TxError::InvalidKernelSignature);
        }

        *sigma += own;
        *fee += u128::from(self.fee);

        if self.asset_emission != 0 {
            // the minted value leaves the balance under the asset generator;
            // under deposit rules it consumes an equal native amount
            let asset = AssetId(*self.commitment.as_bytes());
            let switch = SwitchCommitment::new(gens, &asset);
            let emission = scalar_from_i64(self.asset_emission);
            *sigma -= mul_point(switch.h_gen(), &emission, MulMode::Fast);
            if params.ca_deposit {
                *sigma += mul_point(gens.h(), &emission, MulMode::Fast);
            }
        }
        Ok(())
    }
}

fn scalar_from_i64(value: i64) -> Scalar {
    if value >= 0 {
        Scalar::from(value as u64)
    } else {
        -Scalar::from(value.unsigned_abs())
    }
}

/// Ordered inputs, outputs and kernels plus the blinding-factor offset.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub kernels: Vec<TxKernel>,
    pub offset: ScalarRepr,
}

impl Transaction {
    /// Sort every element list and apply cut-through: drop each output whose
    /// commitment is exactly consumed by an input of this transaction.
    /// Returns the number of pairs removed.
    pub fn normalize(&mut self) -> usize {
        self.inputs.sort_by(|a, b| a.commitment.cmp(&b.commitment));
        self.outputs.sort_by(|a, b| a.commitment.cmp(&b.commitment));
        self.kernels.sort_by_key(|k| k.id(None));

        let inputs = std::mem::take(&mut self.inputs);
        let outputs = std::mem::take(&mut self.outputs);
        let mut kept_inputs = Vec::with_capacity(inputs.len());
        let mut kept_outputs = Vec::with_capacity(outputs.len());
        let mut removed = 0;

        let mut i = 0;
        let mut o = 0;
        while i < inputs.len() && o < outputs.len() {
            match inputs[i].commitment.cmp(&outputs[o].commitment) {
                Ordering::Less => {
                    kept_inputs.push(inputs[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    kept_outputs.push(outputs[o].clone());
                    o += 1;
                }
                Ordering::Equal => {
                    removed += 1;
                    i += 1;
                    o += 1;
                }
            }
        }
        kept_inputs.extend_from_slice(&inputs[i..]);
        kept_outputs.extend(outputs[o..].iter().cloned());

        self.inputs = kept_inputs;
        self.outputs = kept_outputs;
        removed
    }

    /// Full check: structure, proofs, kernel signatures, then value
    /// conservation — the aggregate excess must be the group identity.
    pub fn is_valid(&self, gens: &Generators, ctx: &mut Context) -> Result<(), TxError> {
        ctx.validate_and_summarize(gens, self)?;
        if !is_zero(&ctx.excess()) {
            debug!("transaction does not balance");
            return Err(TxError::Imbalance);
        }
        Ok(())
    }
}

/// Validation parameters: the chain rules the core needs to know about.
#[derive(Clone, Copy, Debug)]
pub struct Params {
    /// Minting a confidential asset consumes an equal native amount.
    pub ca_deposit: bool,
}

impl Default for Params {
    fn default() -> Self {
        Params { ca_deposit: true }
    }
}

/// Aggregate validation context: accumulates the total fee and the excess
/// commitment over one validation pass.
pub struct Context {
    params: Params,
    fee: u128,
    sigma: RistrettoPoint,
}

impl Context {
    pub fn new(params: Params) -> Self {
        Context { params, fee: 0, sigma: RistrettoPoint::identity() }
    }

    /// Restore the accumulators to their initial state.
    pub fn reset(&mut self) {
        self.fee = 0;
        self.sigma = RistrettoPoint::identity();
    }

    pub fn total_fee(&self) -> u128 {
        self.fee
    }

    /// Residual excess accumulated so far; the identity for a balanced
    /// native-asset transaction.
    pub fn excess(&self) -> RistrettoPoint {
        self.sigma
    }

    /// Structural checks plus accumulation.
    ///
    /// Rejects unsorted or duplicate elements and any input/output pair with
    /// the same commitment (cut-through must have been applied), verifies
    /// every range proof (batched) and kernel signature, then folds
    /// commitments, kernel excesses, the offset and the fees into the
    /// accumulators.
    pub fn validate_and_summarize(
        &mut self,
        gens: &Generators,
        tx: &Transaction,
    ) -> Result<(), TxError> {
        for w in tx.inputs.windows(2) {
            match w[0].commitment.cmp(&w[1].commitment) {
                Ordering::Less => {}
                Ordering::Equal => return Err(TxError::DuplicateInput),
                Ordering::Greater => return Err(TxError::Misordered),
            }
        }
        for w in tx.outputs.windows(2) {
            match w[0].commitment.cmp(&w[1].commitment) {
                Ordering::Less => {}
                Ordering::Equal => return Err(TxError::DuplicateOutput),
                Ordering::Greater => return Err(TxError::Misordered),
            }
        }
        let mut i = 0;
        let mut o = 0;
        while i < tx.inputs.len() && o < tx.outputs.len() {
            match tx.inputs[i].commitment.cmp(&tx.outputs[o].commitment) {
                Ordering::Less => i += 1,
                Ordering::Greater => o += 1,
                Ordering::Equal => return Err(TxError::UnresolvedCutThrough),
            }
        }

        let mut sigma = self.sigma;
        let mut fee = 0u128;

        let mut batch = BatchContext::new(true);
        for output in &tx.outputs {
            if !output.is_valid_with(gens, &mut batch) {
                debug!("output {} rejected", output.commitment.as_hex());
                return Err(TxError::InvalidRangeProof);
            }
            sigma += output.commitment.import()?;
        }
        if !batch.flush(gens) {
            debug!("batched range proof verification failed");
            return Err(TxError::InvalidRangeProof);
        }

        for input in &tx.inputs {
            sigma -= input.commitment.import()?;
        }
        for kernel in &tx.kernels {
            kernel.validate(gens, &self.params, 0, &mut fee, &mut sigma)?;
        }

        sigma += mul_point(gens.g(), &tx.offset.import()?, MulMode::Fast);
        sigma += mul_point(gens.h(), &Scalar::from(fee), MulMode::Fast);

        self.sigma = sigma;
        self.fee += fee;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commitment::sk_to_pk;
    use crate::kdf::{HKdf, KeyType};
    use crate::scalar::random_scalar;
    use crate::signature::MultiSig;
    use rand::{rng, RngCore};

    struct Peer {
        k: Scalar,
    }

    impl Peer {
        fn new() -> Self {
            Peer { k: Scalar::ZERO }
        }

        fn add_input(
            &mut self,
            gens: &Generators,
            tx: &mut Transaction,
            kdf: &HKdf,
            value: u64,
            asset: AssetId,
        ) {
            let kidv = KeyIdv::new(rng().next_u64(), 0, KeyType::REGULAR, value);
            let switch = SwitchCommitment::new(gens, &asset);
            let (sk, comm) = switch.create(gens, kdf, &kidv);
            tx.inputs.push(Input { commitment: PointRepr::export(&comm) });
            self.k += *sk;
        }

        fn add_output(
            &mut self,
            gens: &Generators,
            tx: &mut Transaction,
            kdf: &HKdf,
            value: u64,
            asset: AssetId,
        ) {
            let kidv = KeyIdv::new(rng().next_u64(), 0, KeyType::REGULAR, value);
            let (sk, output) = Output::create(gens, kdf, kdf, &kidv, asset, false, 0);
            assert_eq!(output.recover(kdf), Some(kidv));
            tx.outputs.push(output);
            self.k -= *sk;
        }

        fn finalize_excess(&mut self, gens: &Generators, k_g: &mut RistrettoPoint, offset: &mut Scalar) {
            *offset += self.k;

            let split = random_scalar(&mut rng());
            *offset += split;

            // the negated split becomes this peer's kernel key share
            self.k = -split;
            *k_g += gens.g() * self.k;
        }
    }

    struct Maker {
        tx: Transaction,
        kdf: HKdf,
        peers: [Peer; 2],
    }

    impl Maker {
        fn new() -> Self {
            let mut seed = [0u8; 32];
            rng().fill_bytes(&mut seed);
            Maker {
                tx: Transaction::default(),
                kdf: HKdf::generate(&seed),
                peers: [Peer::new(), Peer::new()],
            }
        }

        fn add_input(&mut self, gens: &Generators, peer: usize, value: u64) {
            self.peers[peer].add_input(gens, &mut self.tx, &self.kdf, value, AssetId::NATIVE);
        }

        fn add_output(&mut self, gens: &Generators, peer: usize, value: u64) {
            self.peers[peer].add_output(gens, &mut self.tx, &self.kdf, value, AssetId::NATIVE);
        }

        fn co_sign_kernel(&mut self, gens: &Generators, kernel: &mut TxKernel, lock_image: [u8; 32]) {
            let mut rng = rng();

            // first pass: excesses and nonces are summed
            let mut offset = self.tx.offset.import().unwrap();
            let mut k_g = RistrettoPoint::identity();
            let mut nonces = Vec::new();
            let mut total_nonce = RistrettoPoint::identity();

            for peer in self.peers.iter_mut() {
                peer.finalize_excess(gens, &mut k_g, &mut offset);
                let msig = MultiSig::generate(gens, &mut rng);
                total_nonce += msig.nonce_pub;
                nonces.push(msig);
            }
            self.tx.offset = ScalarRepr::export(&offset);

            for nested in &kernel.nested {
                k_g += nested.commitment.import().unwrap();
            }
            kernel.commitment = PointRepr::export(&k_g);

            let msg = kernel.id(Some(&lock_image));

            // second pass: the total excess is the signature public key
            let mut partials = Vec::new();
            for (peer, mut msig) in self.peers.iter_mut().zip(nonces) {
                msig.nonce_pub = total_nonce;
                partials.push(msig.sign_partial(&msg, &peer.k));
                peer.k = Scalar::ZERO;
            }
            kernel.signature = MultiSig::finalize(&total_nonce, partials);
        }

        /// Build a hash-locked kernel over the peers' current excess, plus an
        /// optional asset emission.
        fn create_tx_kernel(
            &mut self,
            gens: &Generators,
            fee: u64,
            nested: Vec<TxKernel>,
            emit_asset: bool,
        ) -> Vec<TxKernel> {
            let mut rng = rng();
            let mut produced = Vec::new();

            let mut kernel =
                TxKernel { fee, nested, hash_lock: Some(HashLock::default()), ..Default::default() };

            let mut preimage = [0u8; 32];
            rng.fill_bytes(&mut preimage);
            let lock_image = HashLock::image(&preimage);

            if emit_asset {
                let sk_asset = random_scalar(&mut rng);
                let asset = AssetId(sk_to_pk(gens, &sk_asset));
                let value = 4431u64;

                // the deposit input funds the mint; the output consumes it
                self.peers[0].add_input(gens, &mut self.tx, &self.kdf, value, AssetId::NATIVE);
                self.peers[0].add_output(gens, &mut self.tx, &self.kdf, value, asset);

                let mut emission =
                    TxKernel { asset_emission: value as i64, ..Default::default() };
                emission.sign(gens, &sk_asset);
                assert_eq!(*emission.commitment.as_bytes(), asset.0);
                produced.push(emission);

                self.peers[0].k -= sk_asset;
            }

            self.co_sign_kernel(gens, &mut kernel, lock_image);

            // unsatisfied until the correct preimage is revealed
            assert!(kernel.is_valid(gens).is_err());
            kernel.hash_lock = Some(HashLock { preimage });
            assert!(kernel.is_valid(gens).is_ok());

            produced.push(kernel);
            produced
        }
    }

    #[test]
    fn transaction_balances() {
        let gens = Generators::create();
        let mut maker = Maker::new();

        maker.add_input(&gens, 0, 3000);
        maker.add_input(&gens, 0, 2000);
        maker.add_output(&gens, 0, 500);

        maker.add_input(&gens, 1, 1000);
        maker.add_output(&gens, 1, 5400);

        let (fee1, fee2) = (100u64, 2u64);
        let nested = maker.create_tx_kernel(&gens, fee1, Vec::new(), false);

        maker.add_output(&gens, 0, 738);
        maker.add_input(&gens, 1, 740);
        let kernels = maker.create_tx_kernel(&gens, fee2, nested, true);
        maker.tx.kernels.extend(kernels);

        maker.tx.normalize();

        let mut ctx = Context::new(Params::default());
        maker.tx.is_valid(&gens, &mut ctx).unwrap();
        assert_eq!(ctx.total_fee(), u128::from(fee1 + fee2));

        // tampering any single output value must break the balance
        let mut tampered = maker.tx.clone();
        let kidv = KeyIdv::new(1, 0, KeyType::REGULAR, 501);
        let (_, replacement) =
            Output::create(&gens, &maker.kdf, &maker.kdf, &kidv, AssetId::NATIVE, false, 0);
        tampered.outputs[0] = replacement;
        tampered.normalize();
        let mut ctx = Context::new(Params::default());
        assert!(tampered.is_valid(&gens, &mut ctx).is_err());
    }

    #[test]
    fn cut_through() {
        let gens = Generators::create();
        let mut maker = Maker::new();
        maker.add_output(&gens, 0, 3000);
        maker.add_output(&gens, 0, 2000);

        maker.tx.normalize();

        let mut ctx = Context::new(Params::default());
        ctx.validate_and_summarize(&gens, &maker.tx).unwrap();

        // an input that exactly matches an output must have been cut through
        let commitment = maker.tx.outputs[0].commitment;
        maker.tx.inputs.push(Input { commitment });

        ctx.reset();
        assert_eq!(
            ctx.validate_and_summarize(&gens, &maker.tx),
            Err(TxError::UnresolvedCutThrough)
        );

        assert_eq!(maker.tx.normalize(), 1);

        ctx.reset();
        ctx.validate_and_summarize(&gens, &maker.tx).unwrap();
    }

    #[test]
    fn duplicate_outputs_are_rejected() {
        let gens = Generators::create();
        let mut maker = Maker::new();
        maker.add_output(&gens, 0, 3000);

        let dup = maker.tx.outputs[0].clone();
        maker.tx.outputs.push(dup);
        maker.tx.normalize();

        let mut ctx = Context::new(Params::default());
        assert_eq!(
            ctx.validate_and_summarize(&gens, &maker.tx),
            Err(TxError::DuplicateOutput)
        );
    }

    #[test]
    fn kernel_nesting_is_bounded() {
        let gens = Generators::create();
        let mut rng = rng();

        let mut kernel = TxKernel::default();
        kernel.sign(&gens, &random_scalar(&mut rng));
        for _ in 0..MAX_KERNEL_DEPTH + 1 {
            let mut parent = TxKernel { nested: vec![kernel], ..Default::default() };
            parent.sign(&gens, &random_scalar(&mut rng));
            kernel = parent;
        }
        assert_eq!(kernel.is_valid(&gens), Err(TxError::KernelNesting));
    }

    #[test]
    fn coinbase_output_uses_public_proof() {
        let gens = Generators::create();
        let mut seed = [0u8; 32];
        rng().fill_bytes(&mut seed);
        let kdf = HKdf::generate(&seed);

        let kidv = KeyIdv::new(20300, 1, KeyType::COINBASE, 40_000);
        let (_, mut output) = Output::create(&gens, &kdf, &kdf, &kidv, AssetId::NATIVE, true, 0);
        output.coinbase = true;

        assert!(output.is_valid(&gens));
        assert_eq!(output.recover(&kdf), Some(kidv));

        // carrying both proof kinds at once must be rejected
        let mut bad = output.clone();
        bad.confidential_proof = bad.public_proof.map(|_| Confidential::default());
        assert!(!bad.is_valid(&gens));
    }
}
