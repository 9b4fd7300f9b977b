use std::time::Duration;

use alloy::{
    network::{ReceiptResponse, TransactionBuilder},
    node_bindings::{Anvil, AnvilInstance},
    primitives::{Address, TxHash, bytes},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::{client::RpcClient, types::TransactionRequest},
};

use crate::{
    Deployment,
    contract::{AlloyGateway, Gateway, WaveWriter},
    wallet::RpcWallet,
};

/// Poll interval of the node provider, logs and wallet notifications.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Anvil node with a deployed wave portal.
///
/// The deployed code is a minimal hand-assembled implementation of the
/// `WavePortal` interface: `wave` stores the record and emits `NewWave`,
/// `getTotalWaves` and `getAllWaves` read them back. It has no cooldown.
pub struct TestPortal {
    pub anvil: AnvilInstance,
    pub provider: DynProvider,
    pub deployment: Deployment,
}

impl TestPortal {
    pub async fn new() -> Self {
        let anvil = Anvil::new().spawn();
        let client = RpcClient::new_http(anvil.endpoint_url());
        client.set_poll_interval(POLL_INTERVAL);
        let provider = ProviderBuilder::new().connect_client(client).erased();

        let deploy = TransactionRequest::default()
            .with_from(anvil.addresses()[0])
            .with_deploy_code(bytes!("6101f88061000d6000396000f360003560e01c80639a2cdc081461002b578063bd43a9081461010c578063449d46c01461003757600080fd5b60005460005260206000f35b60005460010160801b6060523360605155426060516001015560043560040160c05260c0513560805260805160605160020155600060a0525b60805160a05110156100a35760c05160200160a051013560a05160051c606051016003015560a05160200160a052610070565b6000546001016000553361010052606061012052426101405260805161016052608051601f0160051c60051b60a05260a05160c051602001610180377f6728ef66814a55b797863bf8ffcd954b19cbca4ed4f0e6cf04c980705fd82c3660a051608001610100a1005b6000546020526020610100526020516101205260205160051b6101400160405260006000525b60205160005110156101ec576101406040510360005160051b610140015260005160010160801b606052606051546040515260606040516020015260605160010154604051604001526060516002015460805260805160405160600152600060a0525b60805160a05110156101c85760a05160051c606051016003015460a051604051016080015260a05160200160a052610195565b608051601f0160051c60051b60405101608001604052600051600101600052610132565b61010060405103610100f3"));
        let receipt = provider
            .send_transaction(deploy)
            .await
            .unwrap()
            .get_receipt()
            .await
            .unwrap();
        assert!(receipt.status());

        let deployment = Deployment::custom(
            anvil.chain_id(),
            receipt.contract_address.unwrap(),
            "http://localhost:5100",
        );
        Self { anvil, provider, deployment }
    }

    /// Node-managed account at `index`.
    pub fn account(&self, index: usize) -> Address { self.anvil.addresses()[index] }

    pub fn gateway(&self) -> AlloyGateway<DynProvider> {
        AlloyGateway::new(&self.deployment, self.provider.clone())
    }

    /// Wallet exposing the node-managed accounts.
    pub fn wallet(&self) -> RpcWallet<DynProvider> {
        RpcWallet::new(self.provider.clone()).with_poll_interval(POLL_INTERVAL)
    }

    /// Sends a wave from `from` and waits until it is mined.
    pub async fn wave(&self, from: Address, message: &str) -> TxHash {
        let pending = self.gateway().sign_binding(from).unwrap().wave(message).await.unwrap();
        pending.confirmation().await.unwrap()
    }
}
