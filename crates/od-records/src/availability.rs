//! Sub-name availability under a parent domain contract.

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{SolCall, SolValue};
use od_api_types::abi::IParentDomain;
use od_api_types::{ClaimStatus, LabelStatus};
use od_chain_client::ReadTransport;

use crate::{CallBatch, RecordError};

/// Rejects anything that is not exactly one non-empty label.
pub fn validate_label(label: &str) -> Result<(), RecordError> {
    if label.is_empty() || label.contains('.') {
        return Err(RecordError::InvalidLabel(label.to_owned()));
    }
    Ok(())
}

pub fn build_availability_batch(labels: &[String]) -> Result<CallBatch, RecordError> {
    labels
        .iter()
        .map(|label| -> Result<Bytes, RecordError> {
            validate_label(label)?;
            let call = IParentDomain::subdomainsCall {
                label: label.clone(),
            };
            Ok(call.abi_encode().into())
        })
        .collect()
}

/// A label is claimed once the parent maps it to a non-zero address.
pub fn decode_availability(labels: &[String], results: &[Bytes]) -> Result<Vec<LabelStatus>, RecordError> {
    if results.len() != labels.len() {
        return Err(RecordError::DecodeMismatch {
            expected: labels.len(),
            actual: results.len(),
        });
    }

    labels
        .iter()
        .zip(results)
        .enumerate()
        .map(|(index, (label, raw))| -> Result<LabelStatus, RecordError> {
            let owner = Address::abi_decode(raw).map_err(|source| RecordError::AbiDecode { index, source })?;
            let status = if owner.is_zero() {
                ClaimStatus::Unclaimed
            } else {
                ClaimStatus::Claimed
            };
            Ok(LabelStatus {
                label: label.clone(),
                status,
            })
        })
        .collect()
}

pub async fn check_labels<T>(
    transport: &T,
    parent_domain: Address,
    labels: &[String],
) -> Result<Vec<LabelStatus>, RecordError>
where
    T: ReadTransport + ?Sized,
{
    if labels.is_empty() {
        return Ok(Vec::new());
    }

    let batch = build_availability_batch(labels)?;
    let results = transport
        .aggregate(parent_domain, batch)
        .await
        .map_err(RecordError::BatchTransport)?;
    decode_availability(labels, &results)
}

pub async fn subdomain_names<T>(transport: &T, domain_contract: Address) -> Result<Vec<String>, RecordError>
where
    T: ReadTransport + ?Sized,
{
    let raw = transport
        .call(domain_contract, IParentDomain::getSubdomainNamesCall {}.abi_encode().into())
        .await
        .map_err(RecordError::BatchTransport)?;
    Vec::<String>::abi_decode(&raw).map_err(|source| RecordError::AbiDecode { index: 0, source })
}
