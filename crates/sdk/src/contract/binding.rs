use std::time::Duration;

use alloy::{
    network::ReceiptResponse,
    primitives::{Address, TxHash},
    providers::Provider,
    rpc::types::{Filter, Log},
};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use futures::{FutureExt, Stream, StreamExt, stream};
use tracing::debug;

use super::{Gateway, PendingWave, WaveReader, WaveStream, WaveWriter};
use crate::{
    Deployment, WAVE_GAS_LIMIT,
    abi::WavePortal::{NewWave, WavePortalInstance},
    error::WaveError,
    types::WaveRecord,
};

/// Builds alloy bindings of the deployed contract over `provider`.
///
/// For signing bindings the provider must be able to send transactions
/// from the signer: either the node manages the account, or the provider
/// carries a wallet filler with its key.
#[derive(Clone, Debug)]
pub struct AlloyGateway<P> {
    deployment: Deployment,
    provider: P,
}

impl<P: Provider + Clone + 'static> AlloyGateway<P> {
    pub fn new(deployment: &Deployment, provider: P) -> Self {
        Self { deployment: deployment.clone(), provider }
    }

    fn contract(&self) -> Result<Address, WaveError> {
        let address = self.deployment.wave_portal();
        if address.is_zero() {
            return Err(WaveError::InvalidArgument("contract address is not set".to_string()));
        }
        Ok(address)
    }
}

impl<P: Provider + Clone + 'static> Gateway for AlloyGateway<P> {
    type Reader = ReadBinding<P>;
    type Writer = SignBinding<P>;

    fn read_binding(&self) -> Result<Self::Reader, WaveError> {
        Ok(ReadBinding { instance: WavePortalInstance::new(self.contract()?, self.provider.clone()) })
    }

    fn sign_binding(&self, signer: Address) -> Result<Self::Writer, WaveError> {
        Ok(SignBinding {
            instance: WavePortalInstance::new(self.contract()?, self.provider.clone()),
            signer,
        })
    }
}

/// Read-only binding.
#[derive(Clone, Debug)]
pub struct ReadBinding<P> {
    instance: WavePortalInstance<P>,
}

#[async_trait]
impl<P: Provider + Clone + 'static> WaveReader for ReadBinding<P> {
    async fn total_waves(&self) -> Result<u64, WaveError> {
        Ok(self.instance.getTotalWaves().call().await?.saturating_to())
    }

    async fn all_waves(&self) -> Result<Vec<WaveRecord>, WaveError> {
        let waves = self.instance.getAllWaves().call().await?;
        Ok(waves.into_iter().map(WaveRecord::from).collect())
    }

    async fn new_waves(&self) -> Result<WaveStream, WaveError> {
        let provider = self.instance.provider().clone();
        // Including the current block may repeat a wave of the bulk history,
        // feed merging drops it
        let from_block = provider.get_block_number().await?;
        let filter = Filter::new()
            .address(*self.instance.address())
            .event_signature(NewWave::SIGNATURE_HASH);
        let poll_interval = provider.client().poll_interval();
        Ok(poll_new_waves(provider, filter, from_block, poll_interval).boxed())
    }
}

/// Binding signing for a single account.
#[derive(Clone, Debug)]
pub struct SignBinding<P> {
    instance: WavePortalInstance<P>,
    signer: Address,
}

impl<P> SignBinding<P> {
    pub fn signer(&self) -> Address { self.signer }
}

#[async_trait]
impl<P: Provider + Clone + 'static> WaveWriter for SignBinding<P> {
    async fn wave(&self, message: &str) -> Result<PendingWave, WaveError> {
        let pending = self
            .instance
            .wave(message.to_string())
            .from(self.signer)
            .gas(WAVE_GAS_LIMIT)
            .send()
            .await?;
        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, "wave transaction sent");

        let confirmation = async move {
            let receipt = pending.get_receipt().await?;
            if receipt.status() { Ok(tx_hash) } else { Err(WaveError::Reverted(tx_hash)) }
        };
        Ok(PendingWave::new(tx_hash, confirmation.boxed()))
    }
}

/// Returns stream of waves from `NewWave` logs starting at `from_block`.
///
/// Polls logs of all blocks produced since the previous poll, so the
/// sequence is continuous. A failed `get_logs` is yielded as an error and
/// the same range retried after `poll_interval`. Once logs are fetched the
/// range is consumed, a log that does not decode is yielded as an error in
/// place of its wave.
fn poll_new_waves<P: Provider + 'static>(
    provider: P,
    filter: Filter,
    from_block: u64,
    poll_interval: Duration,
) -> impl Stream<Item = Result<WaveRecord, WaveError>> + Send + 'static {
    stream::unfold((provider, from_block), move |(provider, mut next_block)| {
        let filter = filter.clone();
        async move {
            loop {
                let latest = match provider.get_block_number().await {
                    Ok(latest) => latest,
                    Err(err) => {
                        tokio::time::sleep(poll_interval).await;
                        return Some((vec![Err(err.into())], (provider, next_block)));
                    },
                };
                if latest < next_block {
                    tokio::time::sleep(poll_interval).await;
                    continue;
                }

                let range = filter.clone().from_block(next_block).to_block(latest);
                match provider.get_logs(&range).await {
                    Ok(logs) => {
                        next_block = latest + 1;
                        return Some((decode_new_waves(&logs), (provider, next_block)));
                    },
                    Err(err) => {
                        tokio::time::sleep(poll_interval).await;
                        return Some((vec![Err(err.into())], (provider, next_block)));
                    },
                }
            }
        }
    })
    .flat_map(stream::iter)
}

fn decode_new_waves(logs: &[Log]) -> Vec<Result<WaveRecord, WaveError>> {
    logs.iter().map(decode_new_wave).collect()
}

fn decode_new_wave(log: &Log) -> Result<WaveRecord, WaveError> {
    Ok(log.log_decode::<NewWave>()?.inner.data.into())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Bytes, LogData, U256, address};

    use super::*;

    const CONTRACT: Address = address!("0x27dc3c63364A49dE5cfAA374b786Ad1f10d447e2");
    const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");

    fn log(data: LogData) -> Log {
        Log { inner: alloy::primitives::Log { address: CONTRACT, data }, ..Default::default() }
    }

    fn new_wave(message: &str, timestamp: u64) -> Log {
        let event =
            NewWave { from: ALICE, message: message.to_string(), timestamp: U256::from(timestamp) };
        log(event.encode_log_data())
    }

    #[test]
    fn malformed_log_does_not_hide_the_rest() {
        let truncated = log(LogData::new_unchecked(
            vec![NewWave::SIGNATURE_HASH],
            Bytes::from_static(&[0u8; 16]),
        ));
        let decoded = decode_new_waves(&[new_wave("hi", 1000), truncated, new_wave("yo", 2000)]);

        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].as_ref().unwrap(), &WaveRecord::new(ALICE, "hi", 1000));
        assert!(matches!(decoded[1], Err(WaveError::Abi(_))));
        assert_eq!(decoded[2].as_ref().unwrap(), &WaveRecord::new(ALICE, "yo", 2000));
    }
}
