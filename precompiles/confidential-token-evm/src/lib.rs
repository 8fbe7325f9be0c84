//! EVM Precompile for Confidential Tokens
//!
//! Presents `pallet-confidential-token` to Solidity contracts with the ERC20 function names,
//! every function taking the asset id as its first argument. `balanceOf` and `totalSupply`
//! return indicator values and the `Transfer` log carries the indicator tick, never an amount.
//! Plaintext ERC20 entry points revert.
//!
//! Signed one-shot permits are not exposed: the permit signature is checked against the
//! runtime's native signature scheme, so `confidential_transfer_from_with_permit` is
//! submitted as an extrinsic. EVM callers authorize spenders through `setOperator`.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(test)]
mod mock;

extern crate alloc;

use alloc::vec::Vec;
use core::marker::PhantomData;

use confidential_token_primitives::{EncryptedInput, InputProof, OperatorRegistry};
use fp_evm::PrecompileHandle;
use frame_support::{
    dispatch::{GetDispatchInfo, PostDispatchInfo},
    pallet_prelude::ConstU32,
    BoundedVec,
};
use frame_system::pallet_prelude::BlockNumberFor;
use pallet_evm::AddressMapping;
use precompile_utils::prelude::*;
use precompile_utils::{
    evm::logs::{log3, LogExt},
    keccak256, solidity,
};
use sp_core::{H160, H256, U256};
use sp_runtime::traits::Dispatchable;

/// Size limit for input proofs (matching primitives)
pub const MAX_PROOF_SIZE: u32 = 8192;

type GetMaxProofSize = ConstU32<MAX_PROOF_SIZE>;

/// event Transfer(address indexed from, address indexed to, uint256 value)
pub const SELECTOR_LOG_TRANSFER: [u8; 32] = keccak256!("Transfer(address,address,uint256)");

/// event OperatorSet(address indexed owner, address indexed spender, uint256 expiry)
pub const SELECTOR_LOG_OPERATOR_SET: [u8; 32] = keccak256!("OperatorSet(address,address,uint256)");

pub const INCOMPATIBLE_FUNCTION: &str = "incompatible function";

/// Precompile exposing confidential token functionality to EVM.
pub struct ConfidentialTokenPrecompile<Runtime>(PhantomData<Runtime>);

#[precompile_utils::precompile]
impl<Runtime> ConfidentialTokenPrecompile<Runtime>
where
    Runtime: pallet_confidential_token::Config
        + pallet_operators::Config
        + pallet_evm::Config
        + frame_system::Config,
    <Runtime as frame_system::Config>::RuntimeCall:
        Dispatchable<PostInfo = PostDispatchInfo> + GetDispatchInfo,
    <Runtime as frame_system::Config>::RuntimeCall: From<pallet_confidential_token::Call<Runtime>>
        + From<pallet_operators::Call<Runtime>>,
    <<Runtime as frame_system::Config>::RuntimeCall as Dispatchable>::RuntimeOrigin:
        From<Option<<Runtime as frame_system::Config>::AccountId>>,
    <Runtime as pallet_evm::Config>::AddressMapping:
        AddressMapping<<Runtime as frame_system::Config>::AccountId>,
    <Runtime as pallet_confidential_token::Config>::AssetId: TryFrom<u128> + Into<u128> + Copy,
    <Runtime as pallet_operators::Config>::AssetId: TryFrom<u128> + Copy,
    BlockNumberFor<Runtime>: From<u32>,
{
    // ============ Metadata ============

    /// Solidity: function name(uint128 asset) view returns (string)
    #[precompile::public("name(uint128)")]
    #[precompile::view]
    fn name(handle: &mut impl PrecompileHandle, asset: u128) -> EvmResult<UnboundedBytes> {
        handle.record_db_read::<Runtime>(64)?;
        let asset_id = token_asset::<Runtime>(asset)?;
        Ok(pallet_confidential_token::Pallet::<Runtime>::asset_name(asset_id).into())
    }

    /// Solidity: function symbol(uint128 asset) view returns (string)
    #[precompile::public("symbol(uint128)")]
    #[precompile::view]
    fn symbol(handle: &mut impl PrecompileHandle, asset: u128) -> EvmResult<UnboundedBytes> {
        handle.record_db_read::<Runtime>(64)?;
        let asset_id = token_asset::<Runtime>(asset)?;
        Ok(pallet_confidential_token::Pallet::<Runtime>::asset_symbol(asset_id).into())
    }

    /// Solidity: function decimals(uint128 asset) view returns (uint8)
    #[precompile::public("decimals(uint128)")]
    #[precompile::view]
    fn decimals(handle: &mut impl PrecompileHandle, asset: u128) -> EvmResult<u8> {
        handle.record_db_read::<Runtime>(8)?;
        let asset_id = token_asset::<Runtime>(asset)?;
        Ok(pallet_confidential_token::Pallet::<Runtime>::asset_decimals(asset_id))
    }

    /// Solidity: function isConfidentialToken() view returns (bool)
    #[precompile::public("isConfidentialToken()")]
    #[precompile::view]
    fn is_confidential_token(_handle: &mut impl PrecompileHandle) -> EvmResult<bool> {
        Ok(pallet_confidential_token::Pallet::<Runtime>::is_confidential_token())
    }

    /// Solidity: function balanceOfIsIndicator() view returns (bool)
    #[precompile::public("balanceOfIsIndicator()")]
    #[precompile::view]
    fn balance_of_is_indicator(_handle: &mut impl PrecompileHandle) -> EvmResult<bool> {
        Ok(pallet_confidential_token::Pallet::<Runtime>::balance_of_is_indicator())
    }

    // ============ Indicator Views ============

    /// Displayed (indicator) supply.
    /// Solidity: function totalSupply(uint128 asset) view returns (uint256)
    #[precompile::public("totalSupply(uint128)")]
    #[precompile::view]
    fn total_supply(handle: &mut impl PrecompileHandle, asset: u128) -> EvmResult<U256> {
        // Gas: supply counter and decimals
        handle.record_db_read::<Runtime>(2 + 8)?;
        let asset_id = token_asset::<Runtime>(asset)?;
        Ok(pallet_confidential_token::Pallet::<Runtime>::total_supply(asset_id).into())
    }

    /// Displayed (indicator) balance.
    /// Solidity: function balanceOf(uint128 asset, address who) view returns (uint256)
    #[precompile::public("balanceOf(uint128,address)")]
    #[precompile::view]
    fn balance_of(handle: &mut impl PrecompileHandle, asset: u128, who: Address) -> EvmResult<U256> {
        handle.record_db_read::<Runtime>(2 + 8)?;
        let asset_id = token_asset::<Runtime>(asset)?;
        let who = account_of::<Runtime>(who.into());
        Ok(pallet_confidential_token::Pallet::<Runtime>::balance_of(asset_id, &who).into())
    }

    /// Displayed value of one indicator step.
    /// Solidity: function indicatorTick(uint128 asset) view returns (uint256)
    #[precompile::public("indicatorTick(uint128)")]
    #[precompile::view]
    fn indicator_tick(handle: &mut impl PrecompileHandle, asset: u128) -> EvmResult<U256> {
        handle.record_db_read::<Runtime>(8)?;
        let asset_id = token_asset::<Runtime>(asset)?;
        Ok(pallet_confidential_token::Pallet::<Runtime>::tick_size(asset_id).into())
    }

    // ============ Ciphertext Views ============

    /// Solidity: function confidentialBalanceOf(uint128 asset, address who) view returns (bytes32)
    #[precompile::public("confidentialBalanceOf(uint128,address)")]
    #[precompile::view]
    fn confidential_balance_of(
        handle: &mut impl PrecompileHandle,
        asset: u128,
        who: Address,
    ) -> EvmResult<H256> {
        handle.record_db_read::<Runtime>(32)?;
        let asset_id = token_asset::<Runtime>(asset)?;
        let who = account_of::<Runtime>(who.into());
        let balance =
            pallet_confidential_token::Pallet::<Runtime>::confidential_balance_of(asset_id, &who);
        Ok(H256::from(balance))
    }

    /// Solidity: function confidentialTotalSupply(uint128 asset) view returns (bytes32)
    #[precompile::public("confidentialTotalSupply(uint128)")]
    #[precompile::view]
    fn confidential_total_supply(
        handle: &mut impl PrecompileHandle,
        asset: u128,
    ) -> EvmResult<H256> {
        handle.record_db_read::<Runtime>(32)?;
        let asset_id = token_asset::<Runtime>(asset)?;
        let supply = pallet_confidential_token::Pallet::<Runtime>::confidential_total_supply(asset_id);
        Ok(H256::from(supply))
    }

    /// Solidity: function isOperator(uint128 asset, address owner, address spender) view returns (bool)
    #[precompile::public("isOperator(uint128,address,address)")]
    #[precompile::view]
    fn is_operator(
        handle: &mut impl PrecompileHandle,
        asset: u128,
        owner: Address,
        spender: Address,
    ) -> EvmResult<bool> {
        // Gas: one grant slot
        handle.record_db_read::<Runtime>(64)?;
        let asset_id: <Runtime as pallet_operators::Config>::AssetId =
            asset.try_into().map_err(|_| revert("invalid asset id"))?;
        let owner = account_of::<Runtime>(owner.into());
        let spender = account_of::<Runtime>(spender.into());
        let now = frame_system::Pallet::<Runtime>::block_number();
        Ok(<pallet_operators::Pallet<Runtime> as OperatorRegistry<_, _, _>>::is_operator(
            &owner, &asset_id, &spender, now,
        ))
    }

    // ============ Plaintext ERC20 (always reverts) ============

    /// Solidity: function allowance(uint128 asset, address owner, address spender) view returns (uint256)
    #[precompile::public("allowance(uint128,address,address)")]
    #[precompile::view]
    fn allowance(
        _handle: &mut impl PrecompileHandle,
        asset: u128,
        owner: Address,
        spender: Address,
    ) -> EvmResult<U256> {
        let _ = (asset, owner, spender);
        Err(revert(INCOMPATIBLE_FUNCTION))
    }

    /// Solidity: function transfer(uint128 asset, address to, uint256 value) returns (bool)
    #[precompile::public("transfer(uint128,address,uint256)")]
    fn transfer(
        _handle: &mut impl PrecompileHandle,
        asset: u128,
        to: Address,
        value: U256,
    ) -> EvmResult<bool> {
        let _ = (asset, to, value);
        Err(revert(INCOMPATIBLE_FUNCTION))
    }

    /// Solidity: function transferFrom(uint128 asset, address from, address to, uint256 value) returns (bool)
    #[precompile::public("transferFrom(uint128,address,address,uint256)")]
    fn transfer_from(
        _handle: &mut impl PrecompileHandle,
        asset: u128,
        from: Address,
        to: Address,
        value: U256,
    ) -> EvmResult<bool> {
        let _ = (asset, from, to, value);
        Err(revert(INCOMPATIBLE_FUNCTION))
    }

    /// Solidity: function approve(uint128 asset, address spender, uint256 value) returns (bool)
    #[precompile::public("approve(uint128,address,uint256)")]
    fn approve(
        _handle: &mut impl PrecompileHandle,
        asset: u128,
        spender: Address,
        value: U256,
    ) -> EvmResult<bool> {
        let _ = (asset, spender, value);
        Err(revert(INCOMPATIBLE_FUNCTION))
    }

    // ============ State-Changing Functions ============

    /// Moves an encrypted amount from the caller to `to`.
    /// Solidity: function confidentialTransfer(uint128 asset, address to, bytes32 amount, uint8 utype, uint8 securityZone, bytes proof) external
    #[precompile::public("confidentialTransfer(uint128,address,bytes32,uint8,uint8,bytes)")]
    fn confidential_transfer(
        handle: &mut impl PrecompileHandle,
        asset: u128,
        to: Address,
        amount: H256,
        utype: u8,
        security_zone: u8,
        proof: BoundedBytes<GetMaxProofSize>,
    ) -> EvmResult {
        let caller = handle.context().caller;
        let origin = account_of::<Runtime>(caller);
        let to_h160 = receiver(to)?;
        let to_account = account_of::<Runtime>(to_h160);

        let asset_id = token_asset::<Runtime>(asset)?;
        let input = encrypted_input(amount, utype, security_zone, proof)?;

        RuntimeHelper::<Runtime>::try_dispatch(
            handle,
            Some(origin).into(),
            pallet_confidential_token::Call::<Runtime>::confidential_transfer {
                asset: asset_id,
                to: to_account.clone(),
                input,
            },
            0,
        )?;

        Self::log_transfer(handle, asset_id, caller, to_h160, &to_account)
    }

    /// Moves an encrypted amount out of `owner`'s balance as their operator.
    /// Solidity: function confidentialTransferFrom(uint128 asset, address owner, address to, bytes32 amount, uint8 utype, uint8 securityZone, bytes proof) external
    #[precompile::public(
        "confidentialTransferFrom(uint128,address,address,bytes32,uint8,uint8,bytes)"
    )]
    fn confidential_transfer_from(
        handle: &mut impl PrecompileHandle,
        asset: u128,
        owner: Address,
        to: Address,
        amount: H256,
        utype: u8,
        security_zone: u8,
        proof: BoundedBytes<GetMaxProofSize>,
    ) -> EvmResult {
        let origin = account_of::<Runtime>(handle.context().caller);
        let owner_h160: H160 = owner.into();
        if owner_h160.is_zero() {
            return Err(revert("invalid sender"));
        }
        let to_h160 = receiver(to)?;
        let to_account = account_of::<Runtime>(to_h160);

        let asset_id = token_asset::<Runtime>(asset)?;
        let input = encrypted_input(amount, utype, security_zone, proof)?;

        RuntimeHelper::<Runtime>::try_dispatch(
            handle,
            Some(origin).into(),
            pallet_confidential_token::Call::<Runtime>::confidential_transfer_from {
                asset: asset_id,
                owner: account_of::<Runtime>(owner_h160),
                to: to_account.clone(),
                input,
            },
            0,
        )?;

        Self::log_transfer(handle, asset_id, owner_h160, to_h160, &to_account)
    }

    /// Makes `spender` the caller's operator for `asset` until block `expiry`.
    /// Solidity: function setOperator(uint128 asset, address spender, uint32 expiry) external
    #[precompile::public("setOperator(uint128,address,uint32)")]
    fn set_operator(
        handle: &mut impl PrecompileHandle,
        asset: u128,
        spender: Address,
        expiry: u32,
    ) -> EvmResult {
        let caller = handle.context().caller;
        let origin = account_of::<Runtime>(caller);
        let spender_h160: H160 = spender.into();

        let asset_id: <Runtime as pallet_operators::Config>::AssetId =
            asset.try_into().map_err(|_| revert("invalid asset id"))?;

        RuntimeHelper::<Runtime>::try_dispatch(
            handle,
            Some(origin).into(),
            pallet_operators::Call::<Runtime>::set_operator {
                asset: asset_id,
                spender: account_of::<Runtime>(spender_h160),
                expiry: expiry.into(),
            },
            0,
        )?;

        log3(
            handle.context().address,
            SELECTOR_LOG_OPERATOR_SET,
            H256::from(caller),
            H256::from(spender_h160),
            solidity::encode_event_data(U256::from(expiry)),
        )
        .record(handle)?;

        Ok(())
    }

    /// Emits the ERC20 `Transfer` log with the tick the receiver's new balance derives to.
    fn log_transfer(
        handle: &mut impl PrecompileHandle,
        asset_id: <Runtime as pallet_confidential_token::Config>::AssetId,
        from: H160,
        to: H160,
        to_account: &<Runtime as frame_system::Config>::AccountId,
    ) -> EvmResult {
        handle.record_db_read::<Runtime>(32)?;
        let tick =
            pallet_confidential_token::Pallet::<Runtime>::account_tick(asset_id, to_account)
                .unwrap_or_default();

        log3(
            handle.context().address,
            SELECTOR_LOG_TRANSFER,
            H256::from(from),
            H256::from(to),
            solidity::encode_event_data(U256::from(tick)),
        )
        .record(handle)?;

        Ok(())
    }
}

fn token_asset<Runtime: pallet_confidential_token::Config>(
    asset: u128,
) -> EvmResult<<Runtime as pallet_confidential_token::Config>::AssetId>
where
    <Runtime as pallet_confidential_token::Config>::AssetId: TryFrom<u128>,
{
    asset.try_into().map_err(|_| revert("invalid asset id"))
}

fn account_of<Runtime: pallet_evm::Config>(address: H160) -> <Runtime as frame_system::Config>::AccountId
where
    <Runtime as pallet_evm::Config>::AddressMapping:
        AddressMapping<<Runtime as frame_system::Config>::AccountId>,
{
    <Runtime as pallet_evm::Config>::AddressMapping::into_account_id(address)
}

/// Address mappings may hash `0x0` to a live account, so the null receiver is
/// rejected here rather than after mapping.
fn receiver(to: Address) -> EvmResult<H160> {
    let to: H160 = to.into();
    if to.is_zero() {
        return Err(revert("invalid receiver"));
    }
    Ok(to)
}

fn encrypted_input(
    amount: H256,
    utype: u8,
    security_zone: u8,
    proof: BoundedBytes<GetMaxProofSize>,
) -> EvmResult<EncryptedInput> {
    let proof_vec: Vec<u8> = proof.into();
    let signature: InputProof =
        BoundedVec::try_from(proof_vec).map_err(|_| revert("proof too large"))?;
    Ok(EncryptedInput { handle: amount.0, utype, security_zone, signature })
}
