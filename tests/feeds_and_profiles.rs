//! Jurisdiction feeds, answers and user views against the in-memory store

use std::sync::Arc;

use bson::oid::ObjectId;

use askthem::db::schemas::{PersonDoc, UserDoc, STAFF_ROLE};
use askthem::identities::IdentityService;
use askthem::questions::{NewQuestion, QuestionFeed, QuestionService};
use askthem::signatures::{SignatureService, WithdrawalRule};
use askthem::store::{CivicStore, MemoryStore};
use askthem::users::UserDirectory;
use askthem::AskThemError;

struct Civic {
    store: Arc<dyn CivicStore>,
    questions: QuestionService,
    signatures: SignatureService,
    users: UserDirectory,
    identities: IdentityService,
}

impl Civic {
    fn new() -> Self {
        let store: Arc<dyn CivicStore> = Arc::new(MemoryStore::new());
        Self {
            questions: QuestionService::new(store.clone()),
            signatures: SignatureService::new(store.clone(), WithdrawalRule::default()),
            users: UserDirectory::new(store.clone()),
            identities: IdentityService::new(store.clone()),
            store,
        }
    }

    async fn register(&self, email: &str) -> ObjectId {
        let mut user = UserDoc::new(email.to_string(), "Kim".to_string(), "Park".to_string());
        user.postal_code = Some("10001".to_string());
        user.region = Some("NY".to_string());
        self.users.register(user).await.unwrap()
    }

    async fn person(&self, state: &str, threshold: i64) -> ObjectId {
        self.store
            .insert_person(PersonDoc::new(
                "Council Member".to_string(),
                "Councilmember".to_string(),
                state.to_string(),
                threshold,
            ))
            .await
            .unwrap()
    }

    async fn ask(&self, state: &str, author: ObjectId, person: ObjectId, subject: &str) -> ObjectId {
        self.questions
            .create(
                state,
                NewQuestion {
                    user_id: author,
                    person_id: person,
                    title: format!("About {subject}"),
                    body: "Please explain.".to_string(),
                    subject: Some(subject.to_string()),
                    bill_id: None,
                },
            )
            .await
            .unwrap()
            .id
            .unwrap()
    }
}

fn ids(questions: &[askthem::db::schemas::QuestionDoc]) -> Vec<ObjectId> {
    questions.iter().filter_map(|q| q.id).collect()
}

#[tokio::test]
async fn new_question_starts_with_empty_tally() {
    let civic = Civic::new();
    let author = civic.register("a@example.com").await;
    let person = civic.person("ny", 2).await;

    let id = civic.ask("ny", author, person, "Transit").await;
    let question = civic.questions.get(&id).await.unwrap();
    assert_eq!(question.signature_count, 0);
    assert!(!question.threshold_met);
    assert_eq!(question.state, "ny");
    assert!(question.issued_at.is_some());
}

#[tokio::test]
async fn question_creation_requires_resolvable_references() {
    let civic = Civic::new();
    let author = civic.register("a@example.com").await;

    let result = civic
        .questions
        .create(
            "ny",
            NewQuestion {
                user_id: author,
                person_id: ObjectId::new(),
                title: "  ".to_string(),
                body: "Body".to_string(),
                subject: None,
                bill_id: None,
            },
        )
        .await;

    match result {
        Err(AskThemError::Validation(message)) => {
            assert!(message.contains("title"));
            assert!(message.contains("person"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn feeds_partition_a_jurisdiction() {
    let civic = Civic::new();
    let author = civic.register("a@example.com").await;
    let signer = civic.register("b@example.com").await;
    let person = civic.person("ny", 1).await;
    let elsewhere = civic.person("nj", 1).await;

    let pending = civic.ask("ny", author, person, "Parks").await;
    let popular = civic.ask("ny", author, person, "Housing").await;
    civic.ask("nj", author, elsewhere, "Roads").await;

    civic
        .signatures
        .record_signature(&signer, &popular)
        .await
        .unwrap();
    civic
        .questions
        .answer(&popular, "We are funding it.".to_string(), None)
        .await
        .unwrap();

    let need_signatures = civic.questions.feed("ny", QuestionFeed::NeedSignatures).await.unwrap();
    assert_eq!(ids(&need_signatures), vec![pending]);

    let have_answers = civic.questions.feed("ny", QuestionFeed::HaveAnswers).await.unwrap();
    assert_eq!(ids(&have_answers), vec![popular]);

    let need_answers = civic.questions.feed("ny", QuestionFeed::NeedAnswers).await.unwrap();
    assert_eq!(ids(&need_answers), vec![pending]);

    let recent = civic.questions.feed("ny", QuestionFeed::Recent).await.unwrap();
    assert_eq!(recent.len(), 2);
}

#[tokio::test]
async fn answers_from_unverified_users_are_rejected() {
    let civic = Civic::new();
    let author = civic.register("a@example.com").await;
    let official = civic.register("official@example.com").await;
    let person = civic.person("ny", 1).await;
    let question = civic.ask("ny", author, person, "Schools").await;

    let result = civic
        .questions
        .answer(&question, "Soon.".to_string(), Some(official))
        .await;
    assert!(matches!(result, Err(AskThemError::Validation(_))));

    let missing = civic
        .questions
        .answer(&ObjectId::new(), "Soon.".to_string(), None)
        .await;
    assert!(matches!(missing, Err(AskThemError::NotFound(_))));
}

#[tokio::test]
async fn verified_official_can_answer_and_profile_reflects_it() {
    let civic = Civic::new();
    let author = civic.register("a@example.com").await;
    let official = civic.register("official@example.com").await;
    let person = civic.person("ny", 1).await;

    let mut staff = UserDoc::new("staff@example.com".into(), "Lee".into(), "Admin".into());
    staff.postal_code = Some("10001".to_string());
    staff.roles.push(STAFF_ROLE.to_string());
    let staff = civic.users.register(staff).await.unwrap();

    let claim = civic.identities.claim(&official, &person).await.unwrap();
    assert!(!civic.users.is_verified(&official).await.unwrap());
    civic
        .identities
        .verify(&claim.id.unwrap(), &staff)
        .await
        .unwrap();
    assert!(civic.users.is_verified(&official).await.unwrap());

    let question = civic.ask("ny", author, person, "Water").await;
    let answer = civic
        .questions
        .answer(&question, "Pipes are being replaced.".to_string(), Some(official))
        .await
        .unwrap();
    assert_eq!(answer.user_id, Some(official));

    let profile = civic.users.profile(&official).await.unwrap();
    assert!(profile.verified);
}

#[tokio::test]
async fn user_views_follow_signatures() {
    let civic = Civic::new();
    let author = civic.register("a@example.com").await;
    let signer = civic.register("b@example.com").await;
    let person = civic.person("ny", 3).await;

    let q1 = civic.ask("ny", author, person, "Parks").await;
    let q2 = civic.ask("ny", author, person, "Budget").await;
    civic.ask("ny", author, person, "Parks").await;

    let receipt = civic.signatures.record_signature(&signer, &q1).await.unwrap();
    civic.signatures.record_signature(&signer, &q2).await.unwrap();

    assert!(civic.users.has_signed(&signer, &q1).await.unwrap());
    let mut signed = ids(&civic.users.questions_signed(&signer).await.unwrap());
    signed.sort();
    let mut expected = vec![q1, q2];
    expected.sort();
    assert_eq!(signed, expected);

    civic
        .signatures
        .withdraw_signature(&receipt.signature.id.unwrap())
        .await
        .unwrap();
    assert!(!civic.users.has_signed(&signer, &q1).await.unwrap());

    assert_eq!(
        civic.users.top_issues(&author).await.unwrap(),
        vec!["Budget".to_string(), "Parks".to_string()]
    );
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let civic = Civic::new();
    civic.register("same@example.com").await;

    let mut again = UserDoc::new("same@example.com".into(), "Other".into(), "Person".into());
    again.postal_code = Some("10001".to_string());
    let result = civic.users.register(again).await;
    assert!(matches!(result, Err(AskThemError::Validation(_))));
}
