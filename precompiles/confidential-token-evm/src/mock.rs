//! Mock runtime for testing the confidential token EVM precompile.

use super::*;

use confidential_token_primitives::{
    AssetMetadataProvider, ConfidentialBackend, Debit, Handle, Tick, TickDerivation, TickDomain,
    ZERO_HANDLE,
};
use frame_support::{
    construct_runtime, derive_impl, ensure, parameter_types, storage::unhashed,
    traits::Everything, weights::Weight,
};
use frame_system::EnsureRoot;
use pallet_evm::{EnsureAddressNever, EnsureAddressRoot, FrameSystemAccountProvider};
use parity_scale_codec::{Decode, DecodeWithMemTracking, Encode};
use precompile_utils::{mock_account, precompile_set::*, testing::MockAccount};
use scale_info::TypeInfo;
use sp_runtime::{
    traits::{BlakeTwo256, IdentifyAccount, Lazy, Verify},
    BuildStorage, DispatchError, Perbill, RuntimeDebug,
};

pub type AccountId = MockAccount;
pub type AssetId = u128;
pub type Balance = u128;
pub type Block = frame_system::mocking::MockBlockU32<Runtime>;

pub const ASSET: AssetId = 1;
/// Tick every handle derives to.
pub const TICK: Tick = 77;

// --- Mock FHE backend: plaintexts in unhashed storage, a fresh handle per result ---
pub struct MockFhe;

impl MockFhe {
    fn value_key(handle: &Handle) -> Vec<u8> {
        (b"mock-fhe/value", handle).encode()
    }

    pub fn decrypt(handle: &Handle) -> Option<Balance> {
        if *handle == ZERO_HANDLE {
            return Some(0);
        }
        unhashed::get::<Balance>(&Self::value_key(handle))
    }

    pub fn store(value: Balance) -> Handle {
        let nonce: u64 = unhashed::get_or_default(b"mock-fhe/nonce");
        unhashed::put(b"mock-fhe/nonce", &(nonce + 1));
        let handle = sp_io::hashing::blake2_256(&(b"mock-fhe/handle", nonce).encode());
        unhashed::put(&Self::value_key(&handle), &value);
        handle
    }

    fn read(handle: &Handle) -> Result<Balance, DispatchError> {
        Self::decrypt(handle).ok_or(DispatchError::Other("unknown handle"))
    }
}

impl ConfidentialBackend<AccountId, Balance> for MockFhe {
    fn encrypt(amount: Balance) -> Result<Handle, DispatchError> {
        Ok(Self::store(amount))
    }

    fn verify_input(input: &EncryptedInput, _who: &AccountId) -> Result<Handle, DispatchError> {
        ensure!(!input.signature.is_empty(), DispatchError::Other("missing input proof"));
        Self::read(&input.handle)?;
        Ok(input.handle)
    }

    fn credit(balance: &Handle, amount: &Handle) -> Result<Handle, DispatchError> {
        Ok(Self::store(Self::read(balance)?.saturating_add(Self::read(amount)?)))
    }

    fn debit(balance: &Handle, amount: &Handle) -> Result<Debit, DispatchError> {
        let held = Self::read(balance)?;
        let wanted = Self::read(amount)?;
        let moved = if wanted <= held { wanted } else { 0 };
        Ok(Debit { balance: Self::store(held - moved), debited: Self::store(moved) })
    }

    fn allow(_handle: &Handle, _who: &AccountId) -> Result<(), DispatchError> {
        Ok(())
    }
}

pub struct ConstTick;
impl TickDerivation for ConstTick {
    fn derive(_domain: TickDomain, _handle: &Handle) -> Tick {
        TICK
    }
}

pub struct TestMetadata;
impl AssetMetadataProvider<AssetId> for TestMetadata {
    fn name(_: AssetId) -> Vec<u8> {
        b"Confidential Test Token".to_vec()
    }
    fn symbol(_: AssetId) -> Vec<u8> {
        b"cTST".to_vec()
    }
    fn decimals(_: AssetId) -> u8 {
        18
    }
}

// --- Permit signatures: valid when made by `signer` over exactly `message` ---
#[derive(
    Clone, PartialEq, Eq, Encode, Decode, DecodeWithMemTracking, RuntimeDebug, TypeInfo,
)]
pub struct MockSignature {
    pub signer: [u8; 20],
    pub message: Vec<u8>,
}

pub struct MockSigner(pub AccountId);
impl IdentifyAccount for MockSigner {
    type AccountId = AccountId;
    fn into_account(self) -> AccountId {
        self.0
    }
}

impl Verify for MockSignature {
    type Signer = MockSigner;
    fn verify<L: Lazy<[u8]>>(&self, mut msg: L, signer: &AccountId) -> bool {
        MockAccount::from(H160(self.signer)) == *signer && msg.get() == &self.message[..]
    }
}

construct_runtime!(
    pub enum Runtime {
        System: frame_system,
        Balances: pallet_balances,
        Timestamp: pallet_timestamp,
        Evm: pallet_evm,
        Operators: pallet_operators,
        ConfidentialToken: pallet_confidential_token,
    }
);

parameter_types! {
    pub const BlockHashCount: u32 = 250;
    pub const MaximumBlockWeight: Weight = Weight::from_parts(1024, 1);
    pub const MaximumBlockLength: u32 = 2 * 1024;
    pub const AvailableBlockRatio: Perbill = Perbill::one();
    pub const SS58Prefix: u8 = 42;
}

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Runtime {
    type BaseCallFilter = Everything;
    type RuntimeOrigin = RuntimeOrigin;
    type RuntimeCall = RuntimeCall;
    type RuntimeTask = RuntimeTask;
    type Nonce = u64;
    type Block = Block;
    type Hash = H256;
    type Hashing = BlakeTwo256;
    type AccountId = AccountId;
    type Lookup = sp_runtime::traits::IdentityLookup<Self::AccountId>;
    type RuntimeEvent = RuntimeEvent;
    type BlockHashCount = BlockHashCount;
    type PalletInfo = PalletInfo;
    type AccountData = pallet_balances::AccountData<Balance>;
    type SS58Prefix = SS58Prefix;
}

parameter_types! {
    pub const ExistentialDeposit: u128 = 0;
}

impl pallet_balances::Config for Runtime {
    type MaxReserves = ();
    type ReserveIdentifier = [u8; 4];
    type MaxLocks = ();
    type Balance = Balance;
    type RuntimeEvent = RuntimeEvent;
    type DustRemoval = ();
    type ExistentialDeposit = ExistentialDeposit;
    type AccountStore = System;
    type WeightInfo = ();
    type RuntimeHoldReason = ();
    type FreezeIdentifier = ();
    type MaxFreezes = ();
    type RuntimeFreezeReason = ();
    type DoneSlashHandler = ();
}

parameter_types! {
    pub const MinimumPeriod: u64 = 5;
}

impl pallet_timestamp::Config for Runtime {
    type Moment = u64;
    type OnTimestampSet = ();
    type MinimumPeriod = MinimumPeriod;
    type WeightInfo = ();
}

// Precompile addresses
pub const CONFIDENTIAL_TOKEN_PRECOMPILE: u64 = 2048;

pub type Precompiles<R> = PrecompileSetBuilder<
    R,
    (PrecompileAt<AddressU64<CONFIDENTIAL_TOKEN_PRECOMPILE>, ConfidentialTokenPrecompile<R>>,),
>;

pub type PCall = ConfidentialTokenPrecompileCall<Runtime>;

mock_account!(ConfidentialTokenAddress, |_| MockAccount::from_u64(
    CONFIDENTIAL_TOKEN_PRECOMPILE
));

const MAX_POV_SIZE: u64 = 5 * 1024 * 1024;
const BLOCK_STORAGE_LIMIT: u64 = 40 * 1024;

parameter_types! {
    pub BlockGasLimit: U256 = U256::from(u64::MAX);
    pub PrecompilesValue: Precompiles<Runtime> = Precompiles::new();
    pub const WeightPerGas: Weight = Weight::from_parts(1, 0);
    pub GasLimitPovSizeRatio: u64 = {
        let block_gas_limit = BlockGasLimit::get().min(u64::MAX.into()).low_u64();
        block_gas_limit.saturating_div(MAX_POV_SIZE)
    };
    pub GasLimitStorageGrowthRatio: u64 = {
        let block_gas_limit = BlockGasLimit::get().min(u64::MAX.into()).low_u64();
        block_gas_limit.saturating_div(BLOCK_STORAGE_LIMIT)
    };
}

impl pallet_evm::Config for Runtime {
    type RuntimeEvent = RuntimeEvent;
    type FeeCalculator = ();
    type GasWeightMapping = pallet_evm::FixedGasWeightMapping<Self>;
    type WeightPerGas = WeightPerGas;
    type CallOrigin = EnsureAddressRoot<AccountId>;
    type WithdrawOrigin = EnsureAddressNever<AccountId>;
    type AddressMapping = AccountId;
    type Currency = Balances;
    type Runner = pallet_evm::runner::stack::Runner<Self>;
    type PrecompilesType = Precompiles<Runtime>;
    type PrecompilesValue = PrecompilesValue;
    type ChainId = ();
    type OnChargeTransaction = ();
    type BlockGasLimit = BlockGasLimit;
    type BlockHashMapping = pallet_evm::SubstrateBlockHashMapping<Self>;
    type FindAuthor = ();
    type OnCreate = ();
    type GasLimitPovSizeRatio = GasLimitPovSizeRatio;
    type GasLimitStorageGrowthRatio = GasLimitStorageGrowthRatio;
    type Timestamp = Timestamp;
    type WeightInfo = pallet_evm::weights::SubstrateWeight<Runtime>;
    type AccountProvider = FrameSystemAccountProvider<Runtime>;
    type CreateOriginFilter = ();
    type CreateInnerOriginFilter = ();
}

impl pallet_operators::Config for Runtime {
    type RuntimeEvent = RuntimeEvent;
    type AssetId = AssetId;
    type Signature = MockSignature;
    type Signer = MockSigner;
    type WeightInfo = ();
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl
    pallet_confidential_token::BenchmarkHelper<
        AccountId,
        AssetId,
        Balance,
        pallet_operators::PermitOf<Runtime>,
    > for MockBenchmarkHelper
{
    fn encrypted_input(amount: Balance, _who: &AccountId) -> EncryptedInput {
        encrypted(amount)
    }

    fn grant_operator(asset: AssetId, owner: &AccountId, spender: &AccountId) {
        pallet_operators::Operators::<Runtime>::insert(
            asset,
            owner,
            pallet_operators::OperatorGrant { spender: spender.clone(), expiry: u32::MAX },
        );
    }

    fn permit(
        asset: AssetId,
        owner: &AccountId,
        spender: &AccountId,
        recipient: &AccountId,
        input: &EncryptedInput,
    ) -> pallet_operators::PermitOf<Runtime> {
        let value_hash = input.commitment();
        let deadline = u32::MAX;
        let digest =
            Operators::permit_digest(&asset, owner, spender, recipient, &value_hash, &deadline);
        confidential_token_primitives::TransferPermit {
            owner: owner.clone(),
            spender: spender.clone(),
            recipient: recipient.clone(),
            value_hash,
            deadline,
            signature: MockSignature { signer: H160::from(owner.clone()).0, message: digest.to_vec() },
        }
    }
}

impl pallet_confidential_token::Config for Runtime {
    type RuntimeEvent = RuntimeEvent;
    type AssetId = AssetId;
    type Balance = Balance;
    type Backend = MockFhe;
    type Ticks = ConstTick;
    type Operators = Operators;
    type Permits = Operators;
    type AssetMetadata = TestMetadata;
    type IssuerOrigin = EnsureRoot<AccountId>;
    type WeightInfo = ();
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper = MockBenchmarkHelper;
}

#[derive(Default)]
pub(crate) struct ExtBuilder {
    minted: Vec<(AccountId, Balance)>,
}

impl ExtBuilder {
    /// Confidential balances minted at block 1.
    pub(crate) fn with_minted(mut self, minted: Vec<(AccountId, Balance)>) -> Self {
        self.minted = minted;
        self
    }

    pub(crate) fn build(self) -> sp_io::TestExternalities {
        let t = frame_system::GenesisConfig::<Runtime>::default()
            .build_storage()
            .expect("Frame system builds valid default genesis config");

        let mut ext = sp_io::TestExternalities::new(t);
        ext.execute_with(|| {
            System::set_block_number(1);
            for (who, amount) in self.minted {
                ConfidentialToken::mint(RuntimeOrigin::root(), ASSET, who, amount)
                    .expect("mint to a non-null account succeeds");
            }
        });
        ext
    }
}

pub fn precompiles() -> Precompiles<Runtime> {
    PrecompilesValue::get()
}

/// A backend-registered input encrypting `value`.
pub fn encrypted(value: Balance) -> EncryptedInput {
    EncryptedInput {
        handle: MockFhe::store(value),
        utype: 6,
        security_zone: 0,
        signature: b"input-proof".to_vec().try_into().expect("bounded vec"),
    }
}

/// Plaintext balance of `who`.
pub fn real_balance(who: AccountId) -> Balance {
    MockFhe::decrypt(&ConfidentialToken::confidential_balance_of(ASSET, &who))
        .expect("known handle")
}
