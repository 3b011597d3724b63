use tracing::info;

use slotbook_domain::error::DomainError;
use slotbook_domain::feedback::{Feedback, Rating};

use crate::domain::repository::FeedbackRepository;
use crate::error::ClientError;
use crate::state::store::Store;

pub struct SubmitFeedbackInput {
    pub message: String,
    pub rating: u8,
}

pub struct SubmitFeedbackUseCase<F: FeedbackRepository> {
    pub repo: F,
    pub store: Store,
}

impl<F: FeedbackRepository> SubmitFeedbackUseCase<F> {
    pub async fn execute(&self, input: SubmitFeedbackInput) -> Result<Feedback, ClientError> {
        let user = self.store.require_user()?;
        let message = input.message.trim();
        if message.is_empty() {
            return Err(DomainError::MissingField("message").into());
        }
        let rating = Rating::new(input.rating)?;
        let user_name = match user.name.trim() {
            "" => "Anonymous".to_owned(),
            name => name.to_owned(),
        };
        let feedback = Feedback {
            user_id: user.id.clone(),
            user_role: user.role,
            user_name,
            message: message.to_owned(),
            rating,
        };
        self.repo.insert(&feedback).await?;
        info!(user_id = %user.id, rating = rating.get(), "feedback submitted");
        Ok(feedback)
    }
}
