pub(crate) mod data {
    pub(crate) mod datasources {
        pub(crate) mod app_store_server_api_datasource;
        pub(crate) mod assertion_signer;
        pub(crate) mod signed_data_verifier;
        pub(crate) mod trust_store;
        mod utils;

        pub(crate) use utils::decode_unverified_payload;
    }
    pub(crate) mod models {
        pub(crate) mod app_store_server_api {
            pub(crate) mod check_test_notification_response_model;
            pub(crate) mod error_response_model;
            pub(crate) mod history_response_model;
            pub(crate) mod refund_lookup_response_model;
            pub(crate) mod send_test_notification_response_model;
            pub(crate) mod status_response_model;
            pub(crate) mod transaction_info_response_model;
        }
    }
    pub(crate) mod repositories {
        pub(crate) mod storekit_repository_impl;
    }
}

pub mod domain {
    pub mod entities {
        pub mod environment;
        pub mod refund_history;
        pub mod renewal_info_payload;
        pub mod subscription_status;
        pub mod test_notification;
        pub mod transaction_history;
        pub mod transaction_payload;
        pub mod unverified;
    }
    pub mod repositories {
        pub mod storekit_repository;
    }
}

pub mod config;
pub mod errors;
pub mod util;

#[cfg(test)]
pub(crate) mod test_utils;
