//! Scenario 2: News Router
//!
//! Classifies a query as general knowledge or current events and routes it:
//!
//!   START → route_request → handle_general_query | handle_news_query → END
//!
//! General queries are answered by the model. News queries go to the news
//! search tool. Anything the classifier cannot place is treated as general.

use std::sync::Arc;

use serde_json::json;

use switchyard_contracts::{
    error::{SwitchyardError, SwitchyardResult},
    generation::{GenerationRequest, ToolCall},
    label::{Label, LabelSet},
    request::{HandlerUpdate, RequestState},
};
use switchyard_core::{
    classifier::Classifier,
    registry::ToolRegistry,
    traits::{GenerationService, Handler, ShapeValidator, Tool},
    workflow::RoutingWorkflow,
};
use switchyard_verify::SchemaValidator;

use crate::{model::KeywordModel, tools::NewsSearchTool};

const NEWS_SEARCH: &str = "news_search";

const ROUTER_GUIDANCE: &str = "Route the input to 'general' or 'news' based on whether the user \
    is asking about current events and news or general information.";

const GENERAL_INSTRUCTIONS: &str = "You are a helpful assistant that answers general questions.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    General,
    News,
}

impl Label for QueryKind {
    fn all() -> &'static [Self] {
        &[QueryKind::General, QueryKind::News]
    }

    fn as_str(&self) -> &'static str {
        match self {
            QueryKind::General => "general",
            QueryKind::News => "news",
        }
    }
}

/// Answers general questions with the model.
pub struct GeneralHandler {
    service: Arc<dyn GenerationService>,
}

impl GeneralHandler {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service }
    }
}

impl Handler<QueryKind> for GeneralHandler {
    fn name(&self) -> &str {
        "handle_general_query"
    }

    fn handle(&self, state: &RequestState<QueryKind>) -> SwitchyardResult<HandlerUpdate> {
        let request = GenerationRequest::single_turn(GENERAL_INSTRUCTIONS, state.input.clone());
        let response = self.service.generate(&request)?;
        let answer = response.as_text().ok_or_else(|| SwitchyardError::HandlerFailed {
            handler: self.name().to_string(),
            reason: format!("expected a text answer, got {response:?}"),
        })?;
        Ok(HandlerUpdate::new(answer.trim()).with_decision(QueryKind::General.display_name()))
    }
}

/// Looks the query up with the news search tool. The call goes through a
/// `ToolRegistry`, so the query is checked against the tool's input shape
/// before the tool sees it.
pub struct NewsHandler {
    tools: ToolRegistry,
    validator: Arc<dyn ShapeValidator>,
}

impl NewsHandler {
    pub fn new(search: Arc<dyn Tool>, validator: Arc<dyn ShapeValidator>) -> SwitchyardResult<Self> {
        let mut tools = ToolRegistry::new();
        tools.register_shared(search)?;
        Ok(Self { tools, validator })
    }
}

impl Handler<QueryKind> for NewsHandler {
    fn name(&self) -> &str {
        "handle_news_query"
    }

    fn handle(&self, state: &RequestState<QueryKind>) -> SwitchyardResult<HandlerUpdate> {
        let call = ToolCall::new(NEWS_SEARCH, json!({ "query": state.input }));
        let results = self.tools.invoke(&call, self.validator.as_ref())?;
        Ok(HandlerUpdate::new(format!("News results for '{}': {}", state.input, results))
            .with_decision(QueryKind::News.display_name()))
    }
}

pub fn build_router(
    service: Arc<dyn GenerationService>,
    search: Arc<dyn Tool>,
    validator: Arc<dyn ShapeValidator>,
) -> SwitchyardResult<RoutingWorkflow<QueryKind>> {
    let news = NewsHandler::new(search, validator)?;
    let labels = LabelSet::new([QueryKind::General, QueryKind::News], QueryKind::General)?;
    RoutingWorkflow::builder(
        "news-router",
        Classifier::new(Arc::clone(&service), ROUTER_GUIDANCE),
        labels,
    )
    .route(QueryKind::General, GeneralHandler::new(service))
    .route(QueryKind::News, news)
    .build()
}

/// Run Scenario 2: one news query, one general query, one the classifier
/// cannot place.
pub fn run_scenario() -> SwitchyardResult<()> {
    println!("=== Scenario 2: News Router ===");
    println!();

    let router = build_router(
        Arc::new(KeywordModel::new()),
        Arc::new(NewsSearchTool::new()),
        Arc::new(SchemaValidator::new()),
    )?;

    for input in [
        "What's the latest news on interest rates?",
        "Who was the first president of the United States?",
        "Where can I get a car key cut?",
    ] {
        let response = router.run(input)?;
        println!("  Query:                {}", input);
        println!("  Detected query type:  {}", response.decision);
        println!("  Response:             {}", response.output);
        println!();
    }

    println!("  Scenario 2 complete.");
    println!();
    Ok(())
}
