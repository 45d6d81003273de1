pub mod answer_retrieval;
pub mod prompts;

pub use answer_retrieval::{answer_question, chunks_to_chat_context, retrieve_context, ChatTurn};
