//! Bindings generated at build time from the shared ABI fixtures, compiled
//! against the starkbind runtime.

#[allow(clippy::pedantic, clippy::nursery)]
mod generated {
    include!(concat!(env!("OUT_DIR"), "/shapes.rs"));
    include!(concat!(env!("OUT_DIR"), "/erc20.rs"));
}

pub use generated::{erc20, shapes};

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use starkbind::bind::{
        BindError, BlockId, Call, ContractCaller, ContractTransactor, FunctionCall,
    };
    use starkbind::{event_selector, selector, Error, Felt, U256};

    use super::erc20::Erc20;
    use super::shapes::{Point, PointMoved, Polygon, Shapes};

    const ADDRESS: Felt = Felt::from_hex_unchecked("0x5a11");

    /// Answers calls by entry point selector and records what it was sent.
    #[derive(Clone, Default)]
    struct MockBackend {
        responses: Arc<HashMap<Felt, Vec<Felt>>>,
        requests: Arc<Mutex<Vec<FunctionCall>>>,
        invoked: Arc<Mutex<Vec<Call>>>,
    }

    impl MockBackend {
        fn with_responses<const N: usize>(responses: [(&str, Vec<Felt>); N]) -> Self {
            Self {
                responses: Arc::new(
                    responses
                        .into_iter()
                        .map(|(name, data)| (selector(name).unwrap(), data))
                        .collect(),
                ),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ContractCaller for MockBackend {
        async fn call(
            &self,
            request: FunctionCall,
            _block_id: BlockId,
        ) -> anyhow::Result<Vec<Felt>> {
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
            Ok(Felt::from(0xbeefu64))
        }
    }

    fn felts(values: &[u64]) -> Vec<Felt> {
        values.iter().copied().map(Felt::from).collect()
    }

    fn point(x: u32, y: u32) -> Point {
        Point { x, y }
    }

    #[tokio::test]
    async fn test_struct_output() {
        let backend = MockBackend::with_responses([("get_point", felts(&[3, 4]))]);
        let shapes = Shapes::new(ADDRESS, backend.clone()).unwrap();

        assert_eq!(shapes.caller.get_point().await.unwrap(), point(3, 4));
        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[0].contract_address, ADDRESS);
        assert!(requests[0].calldata.is_empty());
    }

    #[tokio::test]
    async fn test_nested_struct_output_under_snake_case_name() {
        let backend =
            MockBackend::with_responses([("getPolygon", felts(&[7, 2, 1, 2, 3, 4, 1]))]);
        let shapes = Shapes::new(ADDRESS, backend.clone()).unwrap();

        let polygon = shapes.caller.get_polygon(Felt::from(7u64)).await.unwrap();
        assert_eq!(
            polygon,
            Polygon {
                id: Felt::from(7u64),
                vertices: vec![point(1, 2), point(3, 4)],
                closed: true,
            }
        );
        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[0].entry_point_selector, selector("getPolygon").unwrap());
        assert_eq!(requests[0].calldata, felts(&[7]));
    }

    #[tokio::test]
    async fn test_multiple_struct_outputs() {
        let backend = MockBackend::with_responses([("bounds", felts(&[0, 1, 10, 11]))]);
        let shapes = Shapes::new(ADDRESS, backend).unwrap();
        let bounds = shapes.caller.bounds().await.unwrap();
        assert_eq!(bounds, (point(0, 1), point(10, 11)));
    }

    #[tokio::test]
    async fn test_truncated_struct_output() {
        let backend = MockBackend::with_responses([("get_point", felts(&[3]))]);
        let shapes = Shapes::new(ADDRESS, backend).unwrap();
        assert!(matches!(
            shapes.caller.get_point().await,
            Err(BindError::Abi(Error::TruncatedData { .. }))
        ));
    }

    #[tokio::test]
    async fn test_struct_inputs() {
        let backend = MockBackend::default();
        let shapes = Shapes::new(ADDRESS, backend.clone()).unwrap();

        let hash = shapes.transactor.set_point(point(5, 6)).await.unwrap();
        assert_eq!(hash, Felt::from(0xbeefu64));

        let invoked = backend.invoked.lock().unwrap();
        assert_eq!(invoked.len(), 1);
        assert_eq!(invoked[0].to, ADDRESS);
        assert_eq!(invoked[0].selector, selector("set_point").unwrap());
        assert_eq!(invoked[0].calldata, felts(&[5, 6]));
    }

    #[test]
    fn test_call_builder_encodes_nested_structs() {
        let shapes = Shapes::new(ADDRESS, MockBackend::default()).unwrap();
        let call = shapes
            .transactor
            .add_polygon_call(Polygon {
                id: Felt::from(9u64),
                vertices: vec![point(1, 2)],
                closed: false,
            })
            .unwrap();
        assert_eq!(call.selector, selector("add_polygon").unwrap());
        assert_eq!(call.calldata, felts(&[9, 1, 1, 2, 0]));
    }

    #[test]
    fn test_constructor_calldata_with_struct() {
        let calldata = Shapes::<()>::constructor_calldata(point(1, 2)).unwrap();
        assert_eq!(calldata, felts(&[1, 2]));
    }

    #[test]
    fn test_parse_event_with_struct_data() {
        let shapes = Shapes::new(ADDRESS, MockBackend::default()).unwrap();
        let who = Felt::from(0x77u64);
        let keys = [PointMoved::event_selector().unwrap(), who];
        let event = shapes
            .filterer
            .parse_point_moved(&keys, &felts(&[1, 2, 3, 4]))
            .unwrap();
        assert_eq!(
            event,
            PointMoved {
                who,
                from: point(1, 2),
                to: point(3, 4),
            }
        );
        assert_eq!(
            PointMoved::event_selector().unwrap(),
            event_selector(PointMoved::NAME).unwrap()
        );

        let wrong = [selector("Other").unwrap(), who];
        assert!(matches!(
            shapes.filterer.parse_point_moved(&wrong, &felts(&[1, 2, 3, 4])),
            Err(BindError::SelectorMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_erc20_bindings() {
        let backend = MockBackend::with_responses([
            ("balance_of", felts(&[7, 0])),
            ("decimals", felts(&[18])),
        ]);
        let token = Erc20::new(ADDRESS, backend.clone()).unwrap();

        let balance = token.caller.balance_of(Felt::from(0x1u64)).await.unwrap();
        assert_eq!(balance, U256::from(7u64));
        assert_eq!(token.caller.decimals().await.unwrap(), 18);
        assert_eq!(token.address(), ADDRESS);

        let call = token
            .transactor
            .transfer_call(Felt::TWO, U256::from_words(5, 1))
            .unwrap();
        assert_eq!(call.calldata, vec![Felt::TWO, Felt::from(5u64), Felt::ONE]);
    }
}
