pub mod request;
pub mod response;

pub use request::{KvPair, PaymentRequest, UnifiedOrderRequest};
pub use response::{
    GetTokenResponse, JsCode2SessionResponse, MidasCancelPayResponse, MidasGetBalanceResponse,
    MidasPayResponse, MidasPresentResponse, SetUserStorageResponse, UnifiedOrderResponse,
};
