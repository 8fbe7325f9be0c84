use crate::{self as pallet_operators, PermitOf};
use confidential_token_primitives::{Commitment, TransferPermit};
use frame_support::{construct_runtime, derive_impl, weights::constants::RocksDbWeight};
use sp_runtime::{
    testing::{TestSignature, UintAuthorityId},
    BuildStorage,
};

pub type AccountId = u64;
pub type AssetId = u32;
pub type BlockNumber = u64;
pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const CHARLIE: AccountId = 3;
pub const ASSET: AssetId = 7;

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Runtime {
    type Block = frame_system::mocking::MockBlock<Runtime>;
    type DbWeight = RocksDbWeight;
}

impl pallet_operators::Config for Runtime {
    type RuntimeEvent = RuntimeEvent;
    type AssetId = AssetId;
    type Signature = TestSignature;
    type Signer = UintAuthorityId;
    type WeightInfo = ();
}

construct_runtime!(
    pub enum Runtime {
        System: frame_system,
        Operators: pallet_operators,
    }
);

pub fn new_test_ext() -> sp_io::TestExternalities {
    let t = frame_system::GenesisConfig::<Runtime>::default()
        .build_storage()
        .unwrap();
    let mut ext = sp_io::TestExternalities::new(t);
    ext.execute_with(|| System::set_block_number(1));
    ext
}

/// Permit for `spender` moving `value_hash` from `owner` to `recipient`, signed by `signer`.
pub fn permit_signed_by(
    signer: AccountId,
    owner: AccountId,
    spender: AccountId,
    recipient: AccountId,
    value_hash: Commitment,
    deadline: BlockNumber,
) -> PermitOf<Runtime> {
    let digest =
        Operators::permit_digest(&ASSET, &owner, &spender, &recipient, &value_hash, &deadline);
    TransferPermit {
        owner,
        spender,
        recipient,
        value_hash,
        deadline,
        signature: TestSignature(signer, digest.to_vec()),
    }
}

pub fn permit(
    owner: AccountId,
    spender: AccountId,
    recipient: AccountId,
    value_hash: Commitment,
    deadline: BlockNumber,
) -> PermitOf<Runtime> {
    permit_signed_by(owner, owner, spender, recipient, value_hash, deadline)
}
