mod api_credential;
mod new_subscriber;
mod subscriber_email;
mod subscription_result;
mod subscription_tag;
pub use api_credential::ApiCredential;
pub use api_credential::RedactedCredential;
pub use new_subscriber::NewSubscriber;
pub use new_subscriber::SubscribeBody;
pub use subscriber_email::SubscriberEmail;
pub use subscription_result::SubscriptionResult;
pub use subscription_tag::SubscriptionTag;
