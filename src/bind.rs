//! Runtime used by generated bindings: a contract bound to an address and a
//! backend that can read (`call`) and write (`invoke`).

use std::sync::Arc;

use async_trait::async_trait;
use starknet::accounts::ConnectedAccount;
use starknet::core::types::Felt;
use starknet::providers::Provider;

pub use starknet::core::types::{BlockId, BlockTag, Call, FunctionCall};

use crate::abi::{event_selector, selector, Interface, Method};
use crate::codec::{FromValue, Value};
use crate::error::Error;

#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error(transparent)]
    Abi(#[from] Error),
    #[error("method `{0}` is not declared in the contract ABI")]
    MethodNotFound(String),
    #[error("event `{0}` is not declared in the contract ABI")]
    EventNotFound(String),
    #[error("event selector mismatch: expected {expected:#x}, found {found:#x}")]
    SelectorMismatch { expected: Felt, found: Felt },
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Read access to contract state.
#[async_trait]
pub trait ContractCaller: Send + Sync {
    async fn call(&self, request: FunctionCall, block_id: BlockId) -> anyhow::Result<Vec<Felt>>;
}

/// Sends invoke transactions. Returns the transaction hash.
#[async_trait]
pub trait ContractTransactor: Send + Sync {
    async fn invoke(&self, calls: Vec<Call>) -> anyhow::Result<Felt>;
}

#[async_trait]
impl<P> ContractCaller for P
where
    P: Provider + Send + Sync,
{
    async fn call(&self, request: FunctionCall, block_id: BlockId) -> anyhow::Result<Vec<Felt>> {
        Ok(Provider::call(self, request, block_id).await?)
    }
}

#[async_trait]
impl<A> ContractTransactor for A
where
    A: ConnectedAccount + Send + Sync,
{
    async fn invoke(&self, calls: Vec<Call>) -> anyhow::Result<Felt> {
        let result = self
            .execute_v3(calls)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("failed to send invoke transaction: {e}"))?;
        Ok(result.transaction_hash)
    }
}

/// Options for read calls.
#[derive(Debug, Clone)]
pub struct CallOpts {
    pub block_id: BlockId,
}

impl Default for CallOpts {
    fn default() -> Self {
        Self {
            block_id: BlockId::Tag(BlockTag::Latest),
        }
    }
}

/// A deployed contract: address, parsed ABI and backend.
#[derive(Debug, Clone)]
pub struct BoundContract<B> {
    address: Felt,
    interface: Arc<Interface>,
    backend: B,
}

impl<B> BoundContract<B> {
    pub fn new(address: Felt, interface: Arc<Interface>, backend: B) -> Self {
        Self {
            address,
            interface,
            backend,
        }
    }

    pub fn address(&self) -> Felt {
        self.address
    }

    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Same contract and ABI, different backend.
    pub fn with_backend<C>(&self, backend: C) -> BoundContract<C> {
        BoundContract {
            address: self.address,
            interface: Arc::clone(&self.interface),
            backend,
        }
    }

    fn method(&self, name: &str) -> Result<&Method, BindError> {
        self.interface
            .method(name)
            .ok_or_else(|| BindError::MethodNotFound(name.to_string()))
    }

    /// Encode a call to `method` without sending it, e.g. to batch several
    /// calls into one multicall.
    pub fn build_call(&self, method: &str, args: &[Value]) -> Result<Call, BindError> {
        let method = self.method(method)?;
        let selector = match method.selector {
            Some(selector) => selector,
            None => selector(&method.name)?,
        };
        Ok(Call {
            to: self.address,
            selector,
            calldata: self.interface.encode_call(method, args)?,
        })
    }

    /// Decode an emitted event. `keys[0]` must be the event selector.
    pub fn decode_event(
        &self,
        name: &str,
        keys: &[Felt],
        data: &[Felt],
    ) -> Result<(Vec<Value>, Vec<Value>), BindError> {
        let event = self
            .interface
            .event(name)
            .ok_or_else(|| BindError::EventNotFound(name.to_string()))?;
        let expected = event_selector(&event.name)?;
        let (found, keys) = keys
            .split_first()
            .ok_or_else(|| Error::truncated(&event.name, 1, 0))?;
        if *found != expected {
            return Err(BindError::SelectorMismatch {
                expected,
                found: *found,
            });
        }
        Ok(self.interface.decode_event(event, keys, data)?)
    }
}

impl<B: ContractCaller> BoundContract<B> {
    pub async fn call(
        &self,
        opts: &CallOpts,
        method: &str,
        args: &[Value],
    ) -> Result<Vec<Value>, BindError> {
        let call = self.build_call(method, args)?;
        let request = FunctionCall {
            contract_address: call.to,
            entry_point_selector: call.selector,
            calldata: call.calldata,
        };
        let data = self.backend.call(request, opts.block_id).await?;
        Ok(self.interface.decode_output(self.method(method)?, &data)?)
    }
}

impl<B: ContractTransactor> BoundContract<B> {
    pub async fn transact(&self, method: &str, args: &[Value]) -> Result<Felt, BindError> {
        let call = self.build_call(method, args)?;
        Ok(self.backend.invoke(vec![call]).await?)
    }
}

/// Take the next decoded value and convert it to `T`.
pub fn decode_next<T: FromValue>(values: &mut impl Iterator<Item = Value>) -> Result<T, BindError> {
    let value = values
        .next()
        .ok_or_else(|| Error::truncated(std::any::type_name::<T>(), 1, 0))?;
    Ok(T::from_value(value)?)
}

/// Members of a decoded struct value of type `ty`, checked against its
/// declared member count.
pub fn struct_members(
    value: Value,
    ty: &str,
    count: usize,
) -> Result<std::vec::IntoIter<Value>, Error> {
    match value {
        Value::Struct(members) if members.len() == count => Ok(members.into_iter()),
        Value::Struct(members) => Err(Error::Arity {
            args: count,
            values: members.len(),
        }),
        other => Err(Error::conversion(ty, other.describe())),
    }
}

/// Take the next struct member and convert it to `T`.
pub fn decode_member<T: FromValue>(
    members: &mut impl Iterator<Item = Value>,
    ty: &str,
) -> Result<T, Error> {
    let value = members.next().ok_or_else(|| Error::truncated(ty, 1, 0))?;
    T::from_value(value)
}

/// Calldata for deploying a contract with the given ABI.
pub fn constructor_calldata(abi: &str, args: &[Value]) -> Result<Vec<Felt>, BindError> {
    let interface: Interface = abi.parse()?;
    let constructor = interface
        .constructor()
        .ok_or_else(|| BindError::MethodNotFound("constructor".to_string()))?;
    Ok(interface.encode_call(constructor, args)?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use starknet::core::types::U256;

    use super::*;

    const TOKEN_ABI: &str = r#"[
        {"type":"constructor","name":"constructor","inputs":[{"name":"supply","type":"core::integer::u256"}]},
        {"type":"function","name":"balance_of","inputs":[{"name":"account","type":"core::starknet::contract_address::ContractAddress"}],
         "outputs":[{"type":"core::integer::u256"}],"state_mutability":"view"},
        {"type":"function","name":"transfer","inputs":[{"name":"to","type":"core::starknet::contract_address::ContractAddress"},{"name":"amount","type":"core::integer::u256"}],
         "outputs":[],"state_mutability":"external"},
        {"type":"event","name":"contracts::token::Transfer","kind":"struct","members":[
            {"name":"from","type":"core::starknet::contract_address::ContractAddress","kind":"key"},
            {"name":"value","type":"core::integer::u256","kind":"data"}]}
    ]"#;

    #[derive(Default)]
    struct MockBackend {
        responses: HashMap<Felt, Vec<Felt>>,
        requests: Mutex<Vec<FunctionCall>>,
        invoked: Mutex<Vec<Call>>,
    }

    #[async_trait]
    impl ContractCaller for MockBackend {
        async fn call(&self, request: FunctionCall, _block_id: BlockId) -> anyhow::Result<Vec<Felt>> {
            let response = self
                .responses
                .get(&request.entry_point_selector)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no response for selector"))?;
            self.requests.lock().unwrap().push(request);
            Ok(response)
        }
    }

    #[async_trait]
    impl ContractTransactor for MockBackend {
        async fn invoke(&self, calls: Vec<Call>) -> anyhow::Result<Felt> {
            self.invoked.lock().unwrap().extend(calls);
            Ok(Felt::from(0xabcu64))
        }
    }

    fn contract(backend: MockBackend) -> BoundContract<MockBackend> {
        let interface: Interface = TOKEN_ABI.parse().unwrap();
        BoundContract::new(Felt::from(0x1234u64), Arc::new(interface), backend)
    }

    #[tokio::test]
    async fn test_call_decodes_outputs() {
        let mut backend = MockBackend::default();
        backend.responses.insert(
            selector("balance_of").unwrap(),
            vec![Felt::from(500u64), Felt::ZERO],
        );
        let token = contract(backend);

        let out = token
            .call(&CallOpts::default(), "balance_of", &[Value::Felt(Felt::TWO)])
            .await
            .unwrap();
        assert_eq!(out, vec![Value::U256(U256::from(500u64))]);

        let requests = token.backend().requests.lock().unwrap();
        assert_eq!(requests[0].contract_address, Felt::from(0x1234u64));
        assert_eq!(requests[0].calldata, vec![Felt::TWO]);
    }

    #[tokio::test]
    async fn test_backend_errors_are_propagated() {
        let token = contract(MockBackend::default());
        let err = token
            .call(&CallOpts::default(), "balance_of", &[Value::Felt(Felt::ONE)])
            .await
            .unwrap_err();
        assert!(matches!(err, BindError::Backend(_)));
    }

    #[tokio::test]
    async fn test_transact_sends_encoded_call() {
        let token = contract(MockBackend::default());
        let hash = token
            .transact(
                "transfer",
                &[Value::Felt(Felt::THREE), Value::U256(U256::from_words(1, 2))],
            )
            .await
            .unwrap();
        assert_eq!(hash, Felt::from(0xabcu64));

        let invoked = token.backend().invoked.lock().unwrap();
        assert_eq!(invoked.len(), 1);
        assert_eq!(invoked[0].selector, selector("transfer").unwrap());
        assert_eq!(
            invoked[0].calldata,
            vec![Felt::THREE, Felt::ONE, Felt::TWO]
        );
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let token = contract(MockBackend::default());
        assert!(matches!(
            token.transact("mint", &[]).await,
            Err(BindError::MethodNotFound(name)) if name == "mint"
        ));
    }

    #[test]
    fn test_decode_event_checks_selector() {
        let token = contract(MockBackend::default());
        let keys = [event_selector("Transfer").unwrap(), Felt::from(7u64)];
        let data = [Felt::from(9u64), Felt::ZERO];

        let (decoded_keys, decoded_data) = token
            .decode_event("contracts::token::Transfer", &keys, &data)
            .unwrap();
        assert_eq!(decoded_keys, vec![Value::Felt(Felt::from(7u64))]);
        assert_eq!(decoded_data, vec![Value::U256(U256::from(9u64))]);

        let wrong = [selector("Approval").unwrap(), Felt::from(7u64)];
        assert!(matches!(
            token.decode_event("contracts::token::Transfer", &wrong, &data),
            Err(BindError::SelectorMismatch { .. })
        ));
        assert!(matches!(
            token.decode_event("Approval", &keys, &data),
            Err(BindError::EventNotFound(_))
        ));
    }

    #[test]
    fn test_decode_next() {
        let mut values = vec![Value::Felt(Felt::ONE), Value::u32(4)].into_iter();
        assert_eq!(decode_next::<Felt>(&mut values).unwrap(), Felt::ONE);
        assert_eq!(decode_next::<u32>(&mut values).unwrap(), 4);
        assert!(matches!(
            decode_next::<u32>(&mut values),
            Err(BindError::Abi(Error::TruncatedData { .. }))
        ));
    }

    #[test]
    fn test_struct_members() {
        let value = Value::Struct(vec![Value::u32(1), Value::Bool(true)]);
        let mut members = struct_members(value, "contracts::Pair", 2).unwrap();
        assert_eq!(decode_member::<u32>(&mut members, "contracts::Pair").unwrap(), 1);
        assert!(decode_member::<bool>(&mut members, "contracts::Pair").unwrap());
        assert!(matches!(
            decode_member::<bool>(&mut members, "contracts::Pair"),
            Err(Error::TruncatedData { .. })
        ));

        assert!(matches!(
            struct_members(Value::Struct(vec![]), "contracts::Pair", 2),
            Err(Error::Arity { args: 2, values: 0 })
        ));
        assert!(matches!(
            struct_members(Value::Felt(Felt::ONE), "contracts::Pair", 2),
            Err(Error::TypeConversion { .. })
        ));
    }

    #[test]
    fn test_constructor_calldata() {
        let calldata = constructor_calldata(TOKEN_ABI, &[Value::text("1000")]).unwrap();
        assert_eq!(calldata, vec![Felt::from(1000u64), Felt::ZERO]);
        assert!(matches!(
            constructor_calldata("[]", &[]),
            Err(BindError::MethodNotFound(_))
        ));
    }
}
